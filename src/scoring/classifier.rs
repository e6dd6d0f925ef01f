use crate::scoring::pathway::choose_pathway;
use crate::scoring::{DvaTier, GovernorTurnout, MarginTier, TieredRace, DVA_INFEASIBLE};
use crate::votes::{RaceResult, Winner};

/// Net votes Democrats must gain to win by exactly one vote.
pub fn vote_gap(dem_votes: u64, rep_votes: u64) -> i64 {
    rep_votes as i64 + 1 - dem_votes as i64
}

pub fn dem_absenteeism(gov_votes: u64, dem_votes: u64) -> i64 {
    gov_votes as i64 - dem_votes as i64
}

/// Share of absent Democrats that must turn out. Non-positive absenteeism
/// means mobilization alone cannot flip the race.
pub fn dva_pct_needed(vote_gap: i64, dem_absenteeism: i64) -> f64 {
    if dem_absenteeism <= 0 {
        return DVA_INFEASIBLE;
    }
    (vote_gap as f64 * 100.0) / dem_absenteeism as f64
}

/// Scores a Republican-held race. Democratic holds and ties are not flip
/// targets and yield `None`.
pub fn classify_race(race: &RaceResult, turnout: GovernorTurnout) -> Option<TieredRace> {
    if race.winner != Winner::Rep {
        return None;
    }

    let vote_gap = vote_gap(race.dem_votes, race.rep_votes);
    let dem_absenteeism = dem_absenteeism(turnout.gov_votes, race.dem_votes);
    let dva_pct_needed = dva_pct_needed(vote_gap, dem_absenteeism);
    let dva_tier = DvaTier::from_dva_pct(dva_pct_needed);
    let margin_tier = MarginTier::from_margin_pct(race.margin_pct);

    Some(TieredRace {
        race: race.clone(),
        gov_votes: turnout.gov_votes,
        governor_source: turnout.source,
        vote_gap,
        dem_absenteeism,
        dva_pct_needed,
        dva_tier,
        margin_tier,
        pathway: choose_pathway(margin_tier, dva_tier),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::scoring::{GovernorSource, Pathway};
    use crate::votes::RaceKey;

    fn race(dem: u64, rep: u64, other: u64) -> RaceResult {
        let key = RaceKey::new(
            "GUILFORD",
            "G05",
            "NC HOUSE 059",
            NaiveDate::from_ymd_opt(2022, 11, 8).unwrap(),
        );
        RaceResult::from_totals(key, dem, rep, other, None).expect("contested race")
    }

    fn same_election(gov_votes: u64) -> GovernorTurnout {
        GovernorTurnout {
            gov_votes,
            source: GovernorSource::SameElection,
        }
    }

    #[test]
    fn narrow_loss_with_absenteeism_is_highly_flippable() {
        let tiered = classify_race(&race(1000, 1020, 0), same_election(1200)).unwrap();
        assert_eq!(tiered.vote_gap, 21);
        assert_eq!(tiered.dem_absenteeism, 200);
        assert!((tiered.dva_pct_needed - 10.5).abs() < 1e-9);
        assert_eq!(tiered.dva_tier, DvaTier::HighlyFlippable);
        assert_eq!(tiered.margin_tier, MarginTier::High);
    }

    #[test]
    fn no_absenteeism_hits_the_sentinel() {
        let tiered = classify_race(&race(1000, 1050, 0), same_election(1000)).unwrap();
        assert_eq!(tiered.dem_absenteeism, 0);
        assert_eq!(tiered.dva_pct_needed, DVA_INFEASIBLE);
        assert_eq!(tiered.dva_tier, DvaTier::Difficult);
        assert!(!tiered.is_mobilization_feasible());
    }

    #[test]
    fn negative_absenteeism_is_treated_as_none() {
        let tiered = classify_race(&race(1000, 1050, 0), same_election(400)).unwrap();
        assert_eq!(tiered.dem_absenteeism, -600);
        assert_eq!(tiered.dva_pct_needed, DVA_INFEASIBLE);
    }

    #[test]
    fn missing_governor_data_lands_in_difficult() {
        let tiered = classify_race(&race(1000, 1010, 0), GovernorTurnout::missing()).unwrap();
        assert_eq!(tiered.gov_votes, 0);
        assert_eq!(tiered.dva_tier, DvaTier::Difficult);
        assert_eq!(tiered.pathway, Pathway::VoteGap);
    }

    #[test]
    fn democratic_holds_and_ties_are_not_targets() {
        assert!(classify_race(&race(1100, 1000, 0), same_election(1500)).is_none());
        assert!(classify_race(&race(1000, 1000, 0), same_election(1500)).is_none());
    }

    #[test]
    fn gap_uses_plus_one_convention() {
        assert_eq!(vote_gap(1000, 1000), 1);
        assert_eq!(vote_gap(999, 1000), 2);
        assert!((dva_pct_needed(50, 50) - 100.0).abs() < 1e-9);
    }
}
