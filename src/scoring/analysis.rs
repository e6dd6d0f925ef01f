use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::scoring::classifier::classify_race;
use crate::scoring::governor::GovernorIndex;
use crate::scoring::{AnalysisReport, AnalysisStats, GovernorSource};
use crate::store::VoteSource;
use crate::votes::{canonical_county, is_reference_contest, RaceResult, Winner};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOptions {
    pub max_margin_pct: f64,
    pub min_total_votes: u64,
    pub county: Option<String>,
    pub contest_filter: Option<String>,
    pub governor_pattern: String,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_margin_pct: 15.0,
            min_total_votes: 0,
            county: None,
            contest_filter: None,
            governor_pattern: "governor".to_string(),
        }
    }
}

impl AnalysisOptions {
    fn matches_filters(&self, race: &RaceResult) -> bool {
        if let Some(county) = &self.county {
            if canonical_county(county) != race.key.county {
                return false;
            }
        }
        if let Some(contest) = &self.contest_filter {
            let needle = contest.trim().to_lowercase();
            if !race.key.contest_name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Splits races into scored flip targets and Democratic seats to defend.
/// Governor contests are the turnout reference and never targets.
pub fn analyze(
    races: &[RaceResult],
    governors: &GovernorIndex,
    options: &AnalysisOptions,
) -> AnalysisReport {
    let mut report = AnalysisReport::default();
    let stats: &mut AnalysisStats = &mut report.stats;

    for race in races {
        if !options.matches_filters(race) {
            stats.filtered_out += 1;
            continue;
        }
        if is_reference_contest(&race.key.contest_name, &options.governor_pattern) {
            stats.reference_contests += 1;
            continue;
        }
        stats.races_considered += 1;

        if race.total_votes < options.min_total_votes {
            stats.below_min_votes += 1;
            continue;
        }
        if race.margin_pct > options.max_margin_pct {
            stats.above_max_margin += 1;
            continue;
        }

        match race.winner {
            Winner::Tie => {
                debug!("skipping tied race {}", race.key);
                stats.ties_skipped += 1;
            }
            Winner::Dem => report.defensive.push(race.clone()),
            Winner::Rep => {
                let turnout = governors.resolve_for(&race.key);
                if turnout.source == GovernorSource::Missing {
                    stats.missing_governor += 1;
                }
                if let Some(tiered) = classify_race(race, turnout) {
                    report.flippable.push(tiered);
                }
            }
        }
    }

    report.flippable.sort_by(|a, b| {
        b.is_mobilization_feasible()
            .cmp(&a.is_mobilization_feasible())
            .then(a.dva_pct_needed.total_cmp(&b.dva_pct_needed))
            .then(a.race.margin_pct.total_cmp(&b.race.margin_pct))
            .then_with(|| a.race.key.cmp(&b.race.key))
    });
    report
        .defensive
        .sort_by(|a, b| a.margin_pct.total_cmp(&b.margin_pct).then_with(|| a.key.cmp(&b.key)));

    if report.stats.missing_governor > 0 {
        warn!(
            "{} flip targets have no governor turnout data; scored as DIFFICULT",
            report.stats.missing_governor
        );
    }
    info!(
        "analyzed {} races: {} flippable, {} defensive, {} ties skipped",
        report.stats.races_considered,
        report.flippable.len(),
        report.defensive.len(),
        report.stats.ties_skipped
    );
    report
}

/// Fetches totals through the data-access interface and runs [`analyze`].
pub fn analyze_source<S: VoteSource + ?Sized>(
    source: &S,
    options: &AnalysisOptions,
) -> Result<AnalysisReport> {
    let races = source.fetch_race_totals()?;
    let governor_totals = source.fetch_governor_totals(&options.governor_pattern)?;
    let index = GovernorIndex::build(&governor_totals);
    if index.is_empty() {
        warn!(
            "no contests matching {:?} found; every target will score DIFFICULT",
            options.governor_pattern
        );
    }
    Ok(analyze(&races, &index, options))
}
