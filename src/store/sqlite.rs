use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, warn};

use crate::flippable::FlippableRecord;
use crate::scoring::governor::GovernorTotal;
use crate::store::migrations::BASE_MIGRATION;
use crate::store::{FlippableSink, InsertOutcome, VoteSource};
use crate::votes::{aggregate_races, Party, RaceKey, RaceResult, VoteRow, DATE_FORMAT};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed creating data directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening database: {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Opens an existing database without creating it or running
    /// migrations. Every write through this handle fails.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!(
                "database not found: {} (run `import` first)",
                path.display()
            );
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY,
        )
        .with_context(|| format!("failed opening database read-only: {}", path.display()))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn insert_vote_rows(&mut self, rows: &[VoteRow]) -> Result<usize> {
        let imported_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                r#"
INSERT INTO vote_totals(
    county, precinct, contest_name, election_date, party, vote_count, source_file, imported_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
            )?;
            for row in rows {
                stmt.execute(params![
                    row.county.trim(),
                    row.precinct.trim(),
                    row.contest_name.trim(),
                    row.election_date.format(DATE_FORMAT).to_string(),
                    row.party.as_code(),
                    row.vote_count as i64,
                    row.source_file,
                    imported_at
                ])?;
            }
        }
        tx.commit()?;
        debug!("stored {} vote rows", rows.len());
        Ok(rows.len())
    }

    /// Pre-summed rows per raw key and party. Raw keys that only differ in
    /// zero padding are merged later, during aggregation.
    pub fn fetch_vote_rows(&self) -> Result<Vec<VoteRow>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT county, precinct, contest_name, election_date, party, SUM(vote_count), MIN(source_file)
FROM vote_totals
GROUP BY county, precinct, contest_name, election_date, party
"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                let party_raw: String = row.get(4)?;
                Ok(VoteRow {
                    county: row.get(0)?,
                    precinct: row.get(1)?,
                    contest_name: row.get(2)?,
                    election_date: date_column(row, 3)?,
                    party: party_raw.parse().unwrap_or(Party::Other),
                    vote_count: row.get::<_, i64>(5)?.max(0) as u64,
                    source_file: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn vote_row_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vote_totals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn flippable_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM flippable", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl VoteSource for SqliteStore {
    fn fetch_race_totals(&self) -> Result<Vec<RaceResult>> {
        let rows = self.fetch_vote_rows()?;
        Ok(aggregate_races(&rows))
    }

    fn fetch_governor_totals(&self, contest_pattern: &str) -> Result<Vec<GovernorTotal>> {
        let pattern = contest_pattern.trim();
        if pattern.is_empty() {
            warn!("empty governor contest pattern, no reference turnout loaded");
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            r#"
SELECT county, precinct, contest_name, election_date, SUM(vote_count)
FROM vote_totals
WHERE party = 'DEM' AND instr(lower(contest_name), lower(?1)) > 0
GROUP BY county, precinct, contest_name, election_date
"#,
        )?;
        let totals = stmt
            .query_map(params![pattern], |row| {
                Ok(GovernorTotal {
                    county: row.get(0)?,
                    precinct: row.get(1)?,
                    contest_name: row.get(2)?,
                    election_date: date_column(row, 3)?,
                    dem_votes: row.get::<_, i64>(4)?.max(0) as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(totals)
    }
}

impl FlippableSink for SqliteStore {
    fn existing_keys(&self) -> Result<BTreeSet<RaceKey>> {
        let mut stmt = self
            .conn
            .prepare("SELECT county, precinct, contest_name, election_date FROM flippable")?;
        let keys = stmt
            .query_map([], |row| {
                let county: String = row.get(0)?;
                let precinct: String = row.get(1)?;
                let contest_name: String = row.get(2)?;
                Ok(RaceKey::new(
                    &county,
                    &precinct,
                    &contest_name,
                    date_column(row, 3)?,
                ))
            })?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(keys)
    }

    fn load_flippable(&self) -> Result<Vec<FlippableRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT county, election_date, precinct, contest_name, vote_for, dem_votes, oppo_votes,
       gov_votes, dem_margin, dva_pct_needed, source_file, imported_at
FROM flippable
ORDER BY id
"#,
        )?;
        let records = stmt
            .query_map([], row_to_flippable_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn insert_batch(&mut self, records: &[FlippableRecord]) -> Result<InsertOutcome> {
        let mut outcome = InsertOutcome::default();
        let mut tx = self.conn.transaction()?;
        for record in records {
            let sp = tx.savepoint()?;
            let result = sp.execute(
                r#"
INSERT INTO flippable(
    county, election_date, precinct, contest_name, vote_for, dem_votes, oppo_votes,
    gov_votes, dem_margin, dva_pct_needed, source_file, imported_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
"#,
                params![
                    record.county,
                    record.election_date.format(DATE_FORMAT).to_string(),
                    record.precinct,
                    record.contest_name,
                    record.vote_for,
                    record.dem_votes as i64,
                    record.oppo_votes as i64,
                    record.gov_votes as i64,
                    record.dem_margin,
                    record.dva_pct_needed,
                    record.source_file,
                    record.imported_at.to_rfc3339()
                ],
            );
            match result {
                Ok(_) => {
                    sp.commit()?;
                    outcome.inserted += 1;
                }
                Err(err) => {
                    warn!("failed inserting {}: {err}", record.key());
                    outcome.failed += 1;
                }
            }
        }
        tx.commit()?;
        Ok(outcome)
    }
}

fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_flippable_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlippableRecord> {
    let imported_at_raw: String = row.get(11)?;
    let imported_at = DateTime::parse_from_rfc3339(&imported_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;
    Ok(FlippableRecord {
        county: row.get(0)?,
        election_date: date_column(row, 1)?,
        precinct: row.get(2)?,
        contest_name: row.get(3)?,
        vote_for: row.get(4)?,
        dem_votes: row.get::<_, i64>(5)?.max(0) as u64,
        oppo_votes: row.get::<_, i64>(6)?.max(0) as u64,
        gov_votes: row.get::<_, i64>(7)?.max(0) as u64,
        dem_margin: row.get(8)?,
        dva_pct_needed: row.get(9)?,
        source_file: row.get(10)?,
        imported_at,
    })
}
