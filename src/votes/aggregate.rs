use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::votes::{Party, RaceKey, VoteRow};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Winner {
    Dem,
    Rep,
    Tie,
}

impl Display for Winner {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Dem => "DEM",
            Self::Rep => "REP",
            Self::Tie => "TIE",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaceResult {
    #[serde(flatten)]
    pub key: RaceKey,
    pub dem_votes: u64,
    pub rep_votes: u64,
    pub other_votes: u64,
    pub total_votes: u64,
    pub winner: Winner,
    pub margin_pct: f64,
    pub source_file: Option<String>,
}

impl RaceResult {
    /// Builds a contested race. Returns `None` when either major party has
    /// no votes, which also rules out a zero denominator.
    pub fn from_totals(
        key: RaceKey,
        dem_votes: u64,
        rep_votes: u64,
        other_votes: u64,
        source_file: Option<String>,
    ) -> Option<Self> {
        if dem_votes == 0 || rep_votes == 0 {
            return None;
        }
        let total_votes = dem_votes + rep_votes + other_votes;
        if total_votes == 0 {
            return None;
        }
        let winner = if dem_votes > rep_votes {
            Winner::Dem
        } else if rep_votes > dem_votes {
            Winner::Rep
        } else {
            Winner::Tie
        };
        let margin_pct = dem_votes.abs_diff(rep_votes) as f64 / total_votes as f64 * 100.0;
        Some(Self {
            key,
            dem_votes,
            rep_votes,
            other_votes,
            total_votes,
            winner,
            margin_pct,
            source_file,
        })
    }

    /// Signed Democratic lead; negative when the Republican is ahead.
    pub fn dem_margin(&self) -> i64 {
        self.dem_votes as i64 - self.rep_votes as i64
    }
}

#[derive(Debug, Default)]
struct Tally {
    dem: u64,
    rep: u64,
    other: u64,
    source_file: Option<String>,
}

/// Groups vote rows by canonical race key and sums them per party.
/// Uncontested groups are dropped; ties are kept with `Winner::Tie`.
pub fn aggregate_races(rows: &[VoteRow]) -> Vec<RaceResult> {
    let mut tallies: BTreeMap<RaceKey, Tally> = BTreeMap::new();
    for row in rows {
        let tally = tallies.entry(RaceKey::from_row(row)).or_default();
        match row.party {
            Party::Dem => tally.dem += row.vote_count,
            Party::Rep => tally.rep += row.vote_count,
            Party::Other => tally.other += row.vote_count,
        }
        if tally.source_file.is_none() {
            tally.source_file = row.source_file.clone();
        }
    }

    tallies
        .into_iter()
        .filter_map(|(key, tally)| {
            RaceResult::from_totals(key, tally.dem, tally.rep, tally.other, tally.source_file)
        })
        .collect()
}
