pub mod materialize;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::classifier::{dem_absenteeism, dva_pct_needed, vote_gap};
use crate::scoring::{DvaTier, TieredRace};
use crate::votes::RaceKey;

pub use materialize::{insert_if_absent, plan_insertions, MaterializePlan, MaterializeReport};

/// One row of the persisted `flippable` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlippableRecord {
    pub county: String,
    pub election_date: NaiveDate,
    pub precinct: String,
    pub contest_name: String,
    pub vote_for: u32,
    pub dem_votes: u64,
    pub oppo_votes: u64,
    pub gov_votes: u64,
    pub dem_margin: i64,
    pub dva_pct_needed: f64,
    pub source_file: String,
    pub imported_at: DateTime<Utc>,
}

impl FlippableRecord {
    pub fn from_tiered(
        tiered: &TieredRace,
        default_source: &str,
        imported_at: DateTime<Utc>,
    ) -> Self {
        let race = &tiered.race;
        Self {
            county: race.key.county.clone(),
            election_date: race.key.election_date,
            precinct: race.key.precinct.clone(),
            contest_name: race.key.contest_name.clone(),
            vote_for: 1,
            dem_votes: race.dem_votes,
            oppo_votes: race.rep_votes,
            gov_votes: tiered.gov_votes,
            dem_margin: race.dem_margin(),
            dva_pct_needed: tiered.dva_pct_needed,
            source_file: race
                .source_file
                .clone()
                .unwrap_or_else(|| default_source.to_string()),
            imported_at,
        }
    }

    pub fn key(&self) -> RaceKey {
        RaceKey::new(
            &self.county,
            &self.precinct,
            &self.contest_name,
            self.election_date,
        )
    }

    /// DVA percentage re-derived from the stored vote columns.
    pub fn recomputed_dva_pct(&self) -> f64 {
        dva_pct_needed(
            vote_gap(self.dem_votes, self.oppo_votes),
            dem_absenteeism(self.gov_votes, self.dem_votes),
        )
    }

    /// Whether the governor race left any absent Democrats to mobilize.
    /// A very large stored DVA is still feasible when this holds.
    pub fn is_mobilization_feasible(&self) -> bool {
        dem_absenteeism(self.gov_votes, self.dem_votes) > 0
    }

    pub fn dva_tier(&self) -> DvaTier {
        DvaTier::from_dva_pct(self.dva_pct_needed)
    }
}
