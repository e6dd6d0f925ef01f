use anyhow::Result;

use crate::flippable::FlippableRecord;
use crate::scoring::TieredRace;
use crate::votes::DATE_FORMAT;

pub fn flippable_to_csv(races: &[TieredRace]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "county",
        "precinct",
        "contest_name",
        "election_date",
        "dem_votes",
        "rep_votes",
        "other_votes",
        "total_votes",
        "margin_pct",
        "gov_votes",
        "governor_source",
        "vote_gap",
        "dem_absenteeism",
        "dva_pct_needed",
        "dva_tier",
        "margin_tier",
        "pathway",
    ])?;
    for t in races {
        let race = &t.race;
        writer.write_record([
            race.key.county.clone(),
            race.key.precinct.clone(),
            race.key.contest_name.clone(),
            race.key.election_date.format(DATE_FORMAT).to_string(),
            race.dem_votes.to_string(),
            race.rep_votes.to_string(),
            race.other_votes.to_string(),
            race.total_votes.to_string(),
            format!("{:.3}", race.margin_pct),
            t.gov_votes.to_string(),
            t.governor_source.to_string(),
            t.vote_gap.to_string(),
            t.dem_absenteeism.to_string(),
            format!("{:.2}", t.dva_pct_needed),
            t.dva_tier.to_string(),
            t.margin_tier.to_string(),
            t.pathway.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn records_to_csv(records: &[FlippableRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "county",
        "election_date",
        "precinct",
        "contest_name",
        "vote_for",
        "dem_votes",
        "oppo_votes",
        "gov_votes",
        "dem_margin",
        "dva_pct_needed",
        "source_file",
        "imported_at",
    ])?;
    for r in records {
        writer.write_record([
            r.county.clone(),
            r.election_date.format(DATE_FORMAT).to_string(),
            r.precinct.clone(),
            r.contest_name.clone(),
            r.vote_for.to_string(),
            r.dem_votes.to_string(),
            r.oppo_votes.to_string(),
            r.gov_votes.to_string(),
            r.dem_margin.to_string(),
            format!("{:.2}", r.dva_pct_needed),
            r.source_file.clone(),
            r.imported_at.to_rfc3339(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    #[test]
    fn record_csv_has_contract_columns() {
        let record = FlippableRecord {
            county: "WAKE".to_string(),
            election_date: NaiveDate::from_ymd_opt(2022, 11, 8).unwrap(),
            precinct: "74".to_string(),
            contest_name: "NC HOUSE 035".to_string(),
            vote_for: 1,
            dem_votes: 1000,
            oppo_votes: 1020,
            gov_votes: 1200,
            dem_margin: -20,
            dva_pct_needed: 10.5,
            source_file: "wake.csv".to_string(),
            imported_at: Utc::now(),
        };
        let out = records_to_csv(&[record]).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("county,election_date,precinct"));
        assert!(lines
            .next()
            .unwrap()
            .starts_with("WAKE,2022-11-08,74,NC HOUSE 035,1,1000,1020,1200,-20,10.50,wake.csv"));
    }
}
