pub mod aggregate;
pub mod precinct;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use aggregate::{aggregate_races, RaceResult, Winner};
pub use precinct::{canonical_county, canonical_precinct};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Party {
    Dem,
    Rep,
    Other,
}

impl Party {
    pub fn as_code(&self) -> &'static str {
        match self {
            Self::Dem => "DEM",
            Self::Rep => "REP",
            Self::Other => "OTHER",
        }
    }
}

impl Display for Party {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

#[derive(Debug, Error)]
#[error("empty party code")]
pub struct PartyParseError;

impl FromStr for Party {
    type Err = PartyParseError;

    /// Anything that is not recognisably Democratic or Republican counts as
    /// `OTHER` (LIB, GRE, UNA, write-ins).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "" => Err(PartyParseError),
            "DEM" | "D" | "DEMOCRAT" | "DEMOCRATIC" => Ok(Self::Dem),
            "REP" | "R" | "REPUBLICAN" | "GOP" => Ok(Self::Rep),
            _ => Ok(Self::Other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteRow {
    pub county: String,
    pub precinct: String,
    pub contest_name: String,
    pub election_date: NaiveDate,
    pub party: Party,
    pub vote_count: u64,
    #[serde(default)]
    pub source_file: Option<String>,
}

/// Composite identity of a race. Built only through [`RaceKey::new`], so the
/// county and precinct are always in canonical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RaceKey {
    pub county: String,
    pub precinct: String,
    pub contest_name: String,
    pub election_date: NaiveDate,
}

impl RaceKey {
    pub fn new(county: &str, precinct: &str, contest_name: &str, election_date: NaiveDate) -> Self {
        Self {
            county: canonical_county(county),
            precinct: canonical_precinct(precinct),
            contest_name: contest_name.trim().to_string(),
            election_date,
        }
    }

    pub fn from_row(row: &VoteRow) -> Self {
        Self::new(
            &row.county,
            &row.precinct,
            &row.contest_name,
            row.election_date,
        )
    }
}

impl Display for RaceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} / {} / {} / {}",
            self.county,
            self.precinct,
            self.contest_name,
            self.election_date.format(DATE_FORMAT)
        )
    }
}

#[derive(Debug, Error)]
#[error("invalid election date {0:?}, expected YYYY-MM-DD or MM/DD/YYYY")]
pub struct DateParseError(pub String);

pub fn parse_election_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%m/%d/%Y"))
        .map_err(|_| DateParseError(raw.to_string()))
}

/// Case-insensitive substring match used to pick out governor contests.
pub fn is_reference_contest(contest_name: &str, pattern: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    !pattern.is_empty() && contest_name.to_lowercase().contains(&pattern)
}
