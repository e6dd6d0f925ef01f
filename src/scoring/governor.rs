use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scoring::{GovernorSource, GovernorTurnout};
use crate::votes::{
    canonical_county, canonical_precinct, is_reference_contest, Party, RaceKey, VoteRow,
};

/// Democratic vote total of one governor-like contest in one precinct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GovernorTotal {
    pub county: String,
    pub precinct: String,
    pub contest_name: String,
    pub election_date: NaiveDate,
    pub dem_votes: u64,
}

/// Governor Democratic turnout per canonical `(county, precinct)`, by date.
#[derive(Debug, Clone, Default)]
pub struct GovernorIndex {
    by_precinct: HashMap<(String, String), BTreeMap<NaiveDate, u64>>,
}

impl GovernorIndex {
    /// Several contests can match the pattern in one election (governor and
    /// lieutenant governor both contain "governor"). Their totals are not
    /// added together; the highest-turnout contest stands for the precinct.
    pub fn build(totals: &[GovernorTotal]) -> Self {
        let mut per_contest: HashMap<(String, String, String, NaiveDate), u64> = HashMap::new();
        for total in totals {
            let key = (
                canonical_county(&total.county),
                canonical_precinct(&total.precinct),
                total.contest_name.trim().to_ascii_uppercase(),
                total.election_date,
            );
            *per_contest.entry(key).or_default() += total.dem_votes;
        }

        let mut by_precinct: HashMap<(String, String), BTreeMap<NaiveDate, u64>> = HashMap::new();
        for ((county, precinct, _, date), votes) in per_contest {
            let dates = by_precinct.entry((county, precinct)).or_default();
            let slot = dates.entry(date).or_default();
            *slot = (*slot).max(votes);
        }
        debug!("governor index covers {} precincts", by_precinct.len());
        Self { by_precinct }
    }

    pub fn from_rows(rows: &[VoteRow], contest_pattern: &str) -> Self {
        let totals: Vec<GovernorTotal> = rows
            .iter()
            .filter(|row| row.party == Party::Dem)
            .filter(|row| is_reference_contest(&row.contest_name, contest_pattern))
            .map(|row| GovernorTotal {
                county: row.county.clone(),
                precinct: row.precinct.clone(),
                contest_name: row.contest_name.clone(),
                election_date: row.election_date,
                dem_votes: row.vote_count,
            })
            .collect();
        Self::build(&totals)
    }

    pub fn precinct_count(&self) -> usize {
        self.by_precinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_precinct.is_empty()
    }

    /// Same election first, then the most recent earlier election, then the
    /// most recent election overall. No governor data at all yields zero.
    pub fn resolve(&self, county: &str, precinct: &str, election_date: NaiveDate) -> GovernorTurnout {
        let key = (canonical_county(county), canonical_precinct(precinct));
        let Some(dates) = self.by_precinct.get(&key) else {
            return GovernorTurnout::missing();
        };

        if let Some(votes) = dates.get(&election_date) {
            return GovernorTurnout {
                gov_votes: *votes,
                source: GovernorSource::SameElection,
            };
        }
        if let Some((date, votes)) = dates.range(..election_date).next_back() {
            return GovernorTurnout {
                gov_votes: *votes,
                source: GovernorSource::PriorElection(*date),
            };
        }
        match dates.iter().next_back() {
            Some((date, votes)) => GovernorTurnout {
                gov_votes: *votes,
                source: GovernorSource::LaterElection(*date),
            },
            None => GovernorTurnout::missing(),
        }
    }

    pub fn resolve_for(&self, key: &RaceKey) -> GovernorTurnout {
        self.resolve(&key.county, &key.precinct, key.election_date)
    }
}
