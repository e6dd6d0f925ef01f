use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::flippable::FlippableRecord;
use crate::scoring::DvaTier;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierCount {
    pub tier: DvaTier,
    pub races: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountySummary {
    pub county: String,
    pub races: usize,
    pub highly_flippable: usize,
    /// Lowest DVA among races where mobilization is feasible.
    pub best_dva_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DvaSummary {
    pub total_races: usize,
    pub by_tier: Vec<TierCount>,
    pub by_county: Vec<CountySummary>,
    pub missing_governor: usize,
    pub mobilization_feasible: usize,
    pub easiest: Vec<FlippableRecord>,
}

pub fn summarize(records: &[FlippableRecord], top: usize) -> DvaSummary {
    let mut tiers: BTreeMap<DvaTier, usize> = DvaTier::ALL.iter().map(|t| (*t, 0)).collect();
    let mut counties: BTreeMap<String, CountySummary> = BTreeMap::new();
    let mut missing_governor = 0;
    let mut mobilization_feasible = 0;

    for record in records {
        let tier = record.dva_tier();
        *tiers.entry(tier).or_default() += 1;
        if record.gov_votes == 0 {
            missing_governor += 1;
        }
        let feasible = record.is_mobilization_feasible();
        if feasible {
            mobilization_feasible += 1;
        }

        let county = counties
            .entry(record.county.clone())
            .or_insert_with(|| CountySummary {
                county: record.county.clone(),
                races: 0,
                highly_flippable: 0,
                best_dva_pct: None,
            });
        county.races += 1;
        if tier == DvaTier::HighlyFlippable {
            county.highly_flippable += 1;
        }
        if feasible {
            county.best_dva_pct = Some(match county.best_dva_pct {
                Some(best) => best.min(record.dva_pct_needed),
                None => record.dva_pct_needed,
            });
        }
    }

    let mut by_county: Vec<CountySummary> = counties.into_values().collect();
    by_county.sort_by(|a, b| {
        b.highly_flippable
            .cmp(&a.highly_flippable)
            .then(b.races.cmp(&a.races))
            .then_with(|| a.county.cmp(&b.county))
    });

    let mut easiest = records.to_vec();
    easiest.sort_by(|a, b| {
        b.is_mobilization_feasible()
            .cmp(&a.is_mobilization_feasible())
            .then(a.dva_pct_needed.total_cmp(&b.dva_pct_needed))
            .then(b.dem_margin.cmp(&a.dem_margin))
    });
    easiest.truncate(top);

    DvaSummary {
        total_races: records.len(),
        by_tier: tiers
            .into_iter()
            .map(|(tier, races)| TierCount { tier, races })
            .collect(),
        by_county,
        missing_governor,
        mobilization_feasible,
        easiest,
    }
}
