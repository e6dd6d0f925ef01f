use chrono::NaiveDate;
use flip_oracle::flippable::materialize::materialize;
use flip_oracle::scoring::analysis::{analyze_source, AnalysisOptions};
use flip_oracle::scoring::governor::GovernorIndex;
use flip_oracle::scoring::validate::{validate_records, IssueKind};
use flip_oracle::scoring::{DvaTier, GovernorSource, DVA_INFEASIBLE};
use flip_oracle::store::{FlippableSink, SqliteStore, VoteSource};
use flip_oracle::votes::{Party, VoteRow};

fn election() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 11, 8).unwrap()
}

fn row(precinct: &str, contest: &str, party: Party, votes: u64) -> VoteRow {
    VoteRow {
        county: "WAKE".to_string(),
        precinct: precinct.to_string(),
        contest_name: contest.to_string(),
        election_date: election(),
        party,
        vote_count: votes,
        source_file: Some("wake_2022.csv".to_string()),
    }
}

/// Precinct 01: scenario A (gov 1200). Precinct 02: scenario B (gov 1000).
/// Precinct 03: scenario C (no Democratic votes). Precinct 04: a tie.
fn seeded_store() -> SqliteStore {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_vote_rows(&[
            row("01", "NC HOUSE 035", Party::Dem, 1000),
            row("01", "NC HOUSE 035", Party::Rep, 1020),
            row("01", "NC GOVERNOR", Party::Dem, 1200),
            row("01", "NC GOVERNOR", Party::Rep, 1100),
            row("02", "NC HOUSE 035", Party::Dem, 1000),
            row("02", "NC HOUSE 035", Party::Rep, 1050),
            row("02", "NC GOVERNOR", Party::Dem, 1000),
            row("02", "NC GOVERNOR", Party::Rep, 1000),
            row("03", "NC HOUSE 035", Party::Dem, 0),
            row("03", "NC HOUSE 035", Party::Rep, 900),
            row("04", "NC HOUSE 035", Party::Dem, 700),
            row("04", "NC HOUSE 035", Party::Rep, 700),
        ])
        .unwrap();
    store
}

#[test]
fn end_to_end_scenarios_score_as_expected() {
    let store = seeded_store();
    let report = analyze_source(&store, &AnalysisOptions::default()).unwrap();

    let a = report
        .flippable
        .iter()
        .find(|t| t.race.key.precinct == "1")
        .expect("scenario A present");
    assert_eq!(a.vote_gap, 21);
    assert_eq!(a.dem_absenteeism, 200);
    assert!((a.dva_pct_needed - 10.5).abs() < 1e-9);
    assert_eq!(a.dva_tier, DvaTier::HighlyFlippable);
    assert_eq!(a.governor_source, GovernorSource::SameElection);

    let b = report
        .flippable
        .iter()
        .find(|t| t.race.key.precinct == "2")
        .expect("scenario B present");
    assert_eq!(b.dem_absenteeism, 0);
    assert_eq!(b.dva_pct_needed, DVA_INFEASIBLE);
    assert_eq!(b.dva_tier, DvaTier::Difficult);

    assert!(report.flippable.iter().all(|t| t.race.key.precinct != "3"));
    assert!(report.flippable.iter().all(|t| t.race.key.precinct != "4"));
    assert_eq!(report.stats.ties_skipped, 1);
    assert_eq!(report.flippable.len(), 2);
}

#[test]
fn every_result_respects_margin_and_sentinel_bounds() {
    let store = seeded_store();
    for race in store.fetch_race_totals().unwrap() {
        assert!(race.margin_pct >= 0.0 && race.margin_pct <= 100.0);
        assert!(race.total_votes > 0);
    }
    let report = analyze_source(&store, &AnalysisOptions::default()).unwrap();
    for tiered in &report.flippable {
        if tiered.dem_absenteeism <= 0 {
            assert_eq!(tiered.dva_pct_needed, DVA_INFEASIBLE);
        }
        assert_ne!(tiered.race.dem_votes, tiered.race.rep_votes);
    }
}

#[test]
fn rerunning_the_update_inserts_nothing_new() {
    let mut store = seeded_store();
    let options = AnalysisOptions::default();

    let first = analyze_source(&store, &options).unwrap();
    let report = materialize(&mut store, &first.flippable, "vote_totals").unwrap();
    assert_eq!(report.inserted, 2);

    let second = analyze_source(&store, &options).unwrap();
    let report = materialize(&mut store, &second.flippable, "vote_totals").unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(store.load_flippable().unwrap().len(), 2);
}

#[test]
fn zero_padding_between_tables_does_not_change_governor_turnout() {
    let padded = vec![
        row("074", "NC HOUSE 035", Party::Dem, 1000),
        row("074", "NC HOUSE 035", Party::Rep, 1020),
        row("074", "NC GOVERNOR", Party::Dem, 1200),
    ];
    let mixed = vec![
        row("074", "NC HOUSE 035", Party::Dem, 1000),
        row("074", "NC HOUSE 035", Party::Rep, 1020),
        row("74", "NC GOVERNOR", Party::Dem, 1200),
    ];

    for rows in [padded, mixed] {
        let index = GovernorIndex::from_rows(&rows, "governor");
        assert_eq!(index.resolve("WAKE", "074", election()).gov_votes, 1200);
        assert_eq!(index.resolve("WAKE", "74", election()).gov_votes, 1200);

        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_vote_rows(&rows).unwrap();
        let report = analyze_source(&store, &AnalysisOptions::default()).unwrap();
        assert_eq!(report.flippable.len(), 1);
        assert_eq!(report.flippable[0].gov_votes, 1200);
        assert!((report.flippable[0].dva_pct_needed - 10.5).abs() < 1e-9);
    }
}

#[test]
fn materialized_rows_without_governor_data_validate_cleanly() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store
        .insert_vote_rows(&[
            row("15", "NC HOUSE 035", Party::Dem, 800),
            row("15", "NC HOUSE 035", Party::Rep, 840),
        ])
        .unwrap();

    let report = analyze_source(&store, &AnalysisOptions::default()).unwrap();
    let outcome = materialize(&mut store, &report.flippable, "vote_totals").unwrap();
    assert_eq!(outcome.inserted, 1);

    let validation = validate_records(&store.load_flippable().unwrap());
    assert_eq!(validation.count(IssueKind::MissingGovernor), 1);
    assert_eq!(validation.error_count(), 0);
    assert!(validation.is_clean());
}
