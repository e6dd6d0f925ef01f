use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::votes::{parse_election_date, DateParseError, Party, VoteRow};

/// Accepts both the canonical column names and the NCSBE precinct-results
/// headers.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(alias = "County", alias = "COUNTY")]
    county: String,
    #[serde(alias = "Precinct", alias = "PRECINCT")]
    precinct: String,
    #[serde(alias = "Contest Name", alias = "contest", alias = "CONTEST_NAME")]
    contest_name: String,
    #[serde(default, alias = "Election Date", alias = "ELECTION_DATE")]
    election_date: Option<String>,
    #[serde(default, alias = "Choice Party", alias = "party_code", alias = "PARTY")]
    party: Option<String>,
    #[serde(alias = "Total Votes", alias = "votes", alias = "VOTE_COUNT")]
    vote_count: u64,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("line {line}: {source}")]
    Date {
        line: usize,
        #[source]
        source: DateParseError,
    },
    #[error("line {line}: no election date in file and none given on the command line")]
    MissingDate { line: usize },
}

/// Tab-delimited for `.txt`/`.tsv` (the NCSBE export format), comma otherwise.
pub fn delimiter_for(path: &Path) -> u8 {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") | Some("tsv") => b'\t',
        _ => b',',
    }
}

pub fn read_vote_rows(path: &Path, fallback_date: Option<NaiveDate>) -> Result<Vec<VoteRow>> {
    let file = File::open(path)
        .with_context(|| format!("failed opening vote file: {}", path.display()))?;
    let source_file = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let rows = parse_vote_rows(file, delimiter_for(path), &source_file, fallback_date)
        .with_context(|| format!("failed parsing vote file: {}", path.display()))?;
    info!("read {} vote rows from {}", rows.len(), path.display());
    Ok(rows)
}

pub fn parse_vote_rows<R: Read>(
    reader: R,
    delimiter: u8,
    source_file: &str,
    fallback_date: Option<NaiveDate>,
) -> Result<Vec<VoteRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.deserialize::<ImportRow>().enumerate() {
        let line = idx + 2;
        let raw = result?;
        let election_date = match raw.election_date.as_deref().filter(|d| !d.is_empty()) {
            Some(text) => {
                parse_election_date(text).map_err(|source| ImportError::Date { line, source })?
            }
            None => fallback_date.ok_or(ImportError::MissingDate { line })?,
        };
        let party = raw
            .party
            .as_deref()
            .and_then(|p| p.parse::<Party>().ok())
            .unwrap_or(Party::Other);
        rows.push(VoteRow {
            county: raw.county,
            precinct: raw.precinct,
            contest_name: raw.contest_name,
            election_date,
            party,
            vote_count: raw.vote_count,
            source_file: Some(source_file.to_string()),
        });
    }
    debug!("parsed {} rows from {source_file}", rows.len());
    Ok(rows)
}
