pub mod analysis;
pub mod classifier;
pub mod governor;
pub mod pathway;
pub mod summary;
pub mod validate;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::votes::{RaceResult, DATE_FORMAT};

/// `dva_pct_needed` when there is no absenteeism to mobilize.
pub const DVA_INFEASIBLE: f64 = 999.9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DvaTier {
    HighlyFlippable,
    Flippable,
    Competitive,
    StretchTarget,
    Difficult,
}

impl DvaTier {
    pub const ALL: [DvaTier; 5] = [
        DvaTier::HighlyFlippable,
        DvaTier::Flippable,
        DvaTier::Competitive,
        DvaTier::StretchTarget,
        DvaTier::Difficult,
    ];

    pub fn from_dva_pct(dva_pct_needed: f64) -> Self {
        if dva_pct_needed <= 25.0 {
            Self::HighlyFlippable
        } else if dva_pct_needed <= 50.0 {
            Self::Flippable
        } else if dva_pct_needed <= 75.0 {
            Self::Competitive
        } else if dva_pct_needed <= 100.0 {
            Self::StretchTarget
        } else {
            Self::Difficult
        }
    }

    pub fn effort_rank(self) -> u8 {
        match self {
            Self::HighlyFlippable => 0,
            Self::Flippable => 1,
            Self::Competitive => 2,
            Self::StretchTarget => 3,
            Self::Difficult => 4,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::HighlyFlippable => "HIGHLY_FLIPPABLE",
            Self::Flippable => "FLIPPABLE",
            Self::Competitive => "COMPETITIVE",
            Self::StretchTarget => "STRETCH_TARGET",
            Self::Difficult => "DIFFICULT",
        }
    }
}

impl Display for DvaTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

#[derive(Debug, Error)]
#[error("unknown tier: {0}")]
pub struct TierParseError(pub String);

impl FromStr for DvaTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "HIGHLY_FLIPPABLE" | "HIGHLY" => Ok(Self::HighlyFlippable),
            "FLIPPABLE" => Ok(Self::Flippable),
            "COMPETITIVE" => Ok(Self::Competitive),
            "STRETCH_TARGET" | "STRETCH" => Ok(Self::StretchTarget),
            "DIFFICULT" => Ok(Self::Difficult),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

/// Traditional tier from the raw margin, for races where direct vote-gap
/// outreach is the cheaper route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginTier {
    Ultra,
    High,
    Medium,
    Opportunity,
    LongTerm,
}

impl MarginTier {
    pub fn from_margin_pct(margin_pct: f64) -> Self {
        if margin_pct <= 0.5 {
            Self::Ultra
        } else if margin_pct <= 1.0 {
            Self::High
        } else if margin_pct <= 2.0 {
            Self::Medium
        } else if margin_pct <= 5.0 {
            Self::Opportunity
        } else {
            Self::LongTerm
        }
    }

    pub fn effort_rank(self) -> u8 {
        match self {
            Self::Ultra => 0,
            Self::High => 1,
            Self::Medium => 2,
            Self::Opportunity => 3,
            Self::LongTerm => 4,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Ultra => "ULTRA",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Opportunity => "OPPORTUNITY",
            Self::LongTerm => "LONG_TERM",
        }
    }
}

impl Display for MarginTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl FromStr for MarginTier {
    type Err = TierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "ULTRA" => Ok(Self::Ultra),
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "OPPORTUNITY" => Ok(Self::Opportunity),
            "LONG_TERM" | "LONGTERM" => Ok(Self::LongTerm),
            _ => Err(TierParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Pathway {
    /// Persuade or contact enough voters to close the raw vote gap.
    VoteGap,
    /// Turn out Democrats who voted for governor but skipped this race.
    Mobilization,
}

impl Display for Pathway {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VoteGap => write!(f, "vote-gap"),
            Self::Mobilization => write!(f, "mobilization"),
        }
    }
}

/// Where a race's `gov_votes` came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "election_date", rename_all = "snake_case")]
pub enum GovernorSource {
    SameElection,
    PriorElection(NaiveDate),
    LaterElection(NaiveDate),
    Missing,
}

impl Display for GovernorSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SameElection => write!(f, "same"),
            Self::PriorElection(date) => write!(f, "prior {}", date.format(DATE_FORMAT)),
            Self::LaterElection(date) => write!(f, "later {}", date.format(DATE_FORMAT)),
            Self::Missing => write!(f, "missing"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GovernorTurnout {
    pub gov_votes: u64,
    pub source: GovernorSource,
}

impl GovernorTurnout {
    pub fn missing() -> Self {
        Self {
            gov_votes: 0,
            source: GovernorSource::Missing,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TieredRace {
    #[serde(flatten)]
    pub race: RaceResult,
    pub gov_votes: u64,
    pub governor_source: GovernorSource,
    pub vote_gap: i64,
    pub dem_absenteeism: i64,
    pub dva_pct_needed: f64,
    pub dva_tier: DvaTier,
    pub margin_tier: MarginTier,
    pub pathway: Pathway,
}

impl TieredRace {
    pub fn is_mobilization_feasible(&self) -> bool {
        self.dem_absenteeism > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalysisStats {
    pub races_considered: usize,
    pub reference_contests: usize,
    pub ties_skipped: usize,
    pub below_min_votes: usize,
    pub above_max_margin: usize,
    pub filtered_out: usize,
    pub missing_governor: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub flippable: Vec<TieredRace>,
    pub defensive: Vec<RaceResult>,
    pub stats: AnalysisStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dva_breakpoints_are_inclusive() {
        assert_eq!(DvaTier::from_dva_pct(10.5), DvaTier::HighlyFlippable);
        assert_eq!(DvaTier::from_dva_pct(25.0), DvaTier::HighlyFlippable);
        assert_eq!(DvaTier::from_dva_pct(25.01), DvaTier::Flippable);
        assert_eq!(DvaTier::from_dva_pct(50.0), DvaTier::Flippable);
        assert_eq!(DvaTier::from_dva_pct(75.0), DvaTier::Competitive);
        assert_eq!(DvaTier::from_dva_pct(100.0), DvaTier::StretchTarget);
        assert_eq!(DvaTier::from_dva_pct(100.1), DvaTier::Difficult);
        assert_eq!(DvaTier::from_dva_pct(DVA_INFEASIBLE), DvaTier::Difficult);
    }

    #[test]
    fn margin_breakpoints_are_inclusive() {
        assert_eq!(MarginTier::from_margin_pct(0.5), MarginTier::Ultra);
        assert_eq!(MarginTier::from_margin_pct(0.51), MarginTier::High);
        assert_eq!(MarginTier::from_margin_pct(1.0), MarginTier::High);
        assert_eq!(MarginTier::from_margin_pct(2.0), MarginTier::Medium);
        assert_eq!(MarginTier::from_margin_pct(5.0), MarginTier::Opportunity);
        assert_eq!(MarginTier::from_margin_pct(5.5), MarginTier::LongTerm);
    }

    #[test]
    fn tier_codes_round_trip_through_display() {
        for tier in DvaTier::ALL {
            assert_eq!(tier.to_string().parse::<DvaTier>().unwrap(), tier);
        }
        assert_eq!("long-term".parse::<MarginTier>().unwrap(), MarginTier::LongTerm);
        assert!("easy".parse::<DvaTier>().is_err());
    }
}
