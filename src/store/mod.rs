pub mod migrations;
pub mod sqlite;

use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::flippable::FlippableRecord;
use crate::scoring::governor::GovernorTotal;
use crate::votes::{RaceKey, RaceResult};

pub use sqlite::SqliteStore;

/// Read side: where vote totals come from.
pub trait VoteSource {
    /// Contested races, aggregated per canonical race key.
    fn fetch_race_totals(&self) -> Result<Vec<RaceResult>>;

    /// Democratic totals of every contest whose name contains
    /// `contest_pattern`, case-insensitively.
    fn fetch_governor_totals(&self, contest_pattern: &str) -> Result<Vec<GovernorTotal>>;
}

/// Write side: the persisted `flippable` table.
pub trait FlippableSink {
    /// Canonical keys of every persisted record, legacy padded rows included.
    fn existing_keys(&self) -> Result<BTreeSet<RaceKey>>;

    fn load_flippable(&self) -> Result<Vec<FlippableRecord>>;

    /// Inserts records as one unit. A record that fails is counted and
    /// skipped; the rest of the batch still commits.
    fn insert_batch(&mut self, records: &[FlippableRecord]) -> Result<InsertOutcome>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: usize,
    pub failed: usize,
}
