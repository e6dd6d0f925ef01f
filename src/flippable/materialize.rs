use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::flippable::FlippableRecord;
use crate::scoring::TieredRace;
use crate::store::FlippableSink;
use crate::votes::RaceKey;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterializePlan {
    pub new_records: Vec<FlippableRecord>,
    pub skipped_existing: usize,
    pub skipped_duplicate: usize,
}

impl MaterializePlan {
    pub fn skipped(&self) -> usize {
        self.skipped_existing + self.skipped_duplicate
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaterializeReport {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Set difference between scored races and what is already persisted.
/// Nothing already present is touched; repeats inside the batch are kept once.
pub fn plan_insertions(
    existing: &BTreeSet<RaceKey>,
    races: &[TieredRace],
    default_source: &str,
    imported_at: DateTime<Utc>,
) -> MaterializePlan {
    let mut plan = MaterializePlan::default();
    let mut seen: BTreeSet<RaceKey> = BTreeSet::new();
    for tiered in races {
        let key = tiered.race.key.clone();
        if existing.contains(&key) {
            plan.skipped_existing += 1;
            continue;
        }
        if !seen.insert(key) {
            plan.skipped_duplicate += 1;
            continue;
        }
        plan.new_records
            .push(FlippableRecord::from_tiered(tiered, default_source, imported_at));
    }
    plan
}

pub fn insert_if_absent<S: FlippableSink + ?Sized>(
    sink: &mut S,
    plan: &MaterializePlan,
) -> Result<MaterializeReport> {
    let outcome = if plan.new_records.is_empty() {
        Default::default()
    } else {
        sink.insert_batch(&plan.new_records)?
    };
    let report = MaterializeReport {
        inserted: outcome.inserted,
        skipped: plan.skipped(),
        failed: outcome.failed,
    };
    info!(
        "flippable update: {} inserted, {} skipped, {} failed",
        report.inserted, report.skipped, report.failed
    );
    Ok(report)
}

/// Reads the persisted keys, plans, and writes in one pass.
pub fn materialize<S: FlippableSink + ?Sized>(
    sink: &mut S,
    races: &[TieredRace],
    default_source: &str,
) -> Result<MaterializeReport> {
    let existing = sink.existing_keys()?;
    let plan = plan_insertions(&existing, races, default_source, Utc::now());
    insert_if_absent(sink, &plan)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::scoring::classifier::classify_race;
    use crate::scoring::{GovernorSource, GovernorTurnout};
    use crate::store::SqliteStore;
    use crate::votes::RaceResult;

    fn tiered(precinct: &str, dem: u64, rep: u64, gov: u64) -> TieredRace {
        let key = RaceKey::new(
            "MECKLENBURG",
            precinct,
            "NC SENATE 041",
            NaiveDate::from_ymd_opt(2022, 11, 8).unwrap(),
        );
        let race = RaceResult::from_totals(key, dem, rep, 0, None).unwrap();
        classify_race(
            &race,
            GovernorTurnout {
                gov_votes: gov,
                source: GovernorSource::SameElection,
            },
        )
        .unwrap()
    }

    #[test]
    fn second_run_inserts_nothing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let races = vec![tiered("101", 1000, 1020, 1200), tiered("102", 800, 900, 1000)];

        let first = materialize(&mut store, &races, "vote_totals").unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped, 0);

        let second = materialize(&mut store, &races, "vote_totals").unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.flippable_count().unwrap(), 2);
    }

    #[test]
    fn padded_legacy_rows_count_as_existing() {
        let mut existing = BTreeSet::new();
        existing.insert(RaceKey::new(
            "Mecklenburg",
            "0101",
            "NC SENATE 041",
            NaiveDate::from_ymd_opt(2022, 11, 8).unwrap(),
        ));
        let plan = plan_insertions(
            &existing,
            &[tiered("101", 1000, 1020, 1200)],
            "vote_totals",
            Utc::now(),
        );
        assert!(plan.new_records.is_empty());
        assert_eq!(plan.skipped_existing, 1);
    }

    #[test]
    fn batch_duplicates_are_emitted_once() {
        let races = vec![tiered("7", 1000, 1020, 1200), tiered("007", 1000, 1020, 1200)];
        let plan = plan_insertions(&BTreeSet::new(), &races, "vote_totals", Utc::now());
        assert_eq!(plan.new_records.len(), 1);
        assert_eq!(plan.skipped_duplicate, 1);
    }

    #[test]
    fn records_follow_the_output_contract() {
        let plan = plan_insertions(
            &BTreeSet::new(),
            &[tiered("101", 1000, 1020, 1200)],
            "vote_totals",
            Utc::now(),
        );
        let record = &plan.new_records[0];
        assert_eq!(record.vote_for, 1);
        assert_eq!(record.oppo_votes, 1020);
        assert_eq!(record.dem_margin, -20);
        assert_eq!(record.gov_votes, 1200);
        assert!((record.dva_pct_needed - 10.5).abs() < 1e-9);
        assert_eq!(record.source_file, "vote_totals");
    }
}
