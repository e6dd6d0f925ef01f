use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin;
use chrono::{NaiveDate, Utc};
use flip_oracle::flippable::FlippableRecord;
use flip_oracle::store::{FlippableSink, SqliteStore};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flip-oracle-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn run(dir: &PathBuf, args: &[&str]) -> std::process::Output {
    let crate_name = env!("CARGO_PKG_NAME");
    let db = dir.join("flip.db");
    let config = dir.join("config.toml");
    assert_cmd::Command::new(cargo_bin(crate_name))
        .arg("--config")
        .arg(&config)
        .arg("--db")
        .arg(&db)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn cli_version_works() {
    let crate_name = env!("CARGO_PKG_NAME");
    let output = assert_cmd::Command::new(cargo_bin(crate_name))
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success(), "command returned with non-success exit code");
    let version = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    assert_eq!(version, format!("{} {}", crate_name, env!("CARGO_PKG_VERSION")));
}

#[test]
fn import_then_update_is_idempotent() {
    let dir = scratch_dir("update");
    let votes = dir.join("votes.csv");
    fs::write(
        &votes,
        "county,precinct,contest_name,election_date,party,vote_count\n\
         Wake,01,NC HOUSE 035,2022-11-08,DEM,1000\n\
         Wake,01,NC HOUSE 035,2022-11-08,REP,1020\n\
         Wake,1,NC GOVERNOR,2022-11-08,DEM,1200\n\
         Wake,1,NC GOVERNOR,2022-11-08,REP,1100\n",
    )
    .unwrap();

    let output = run(&dir, &["import", votes.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Imported 4 vote rows"));

    let output = run(&dir, &["update", "--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NC HOUSE 035"));
    assert!(stdout.contains("1 records would be inserted"));

    let output = run(&dir, &["update"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Inserted: 1"));

    let output = run(&dir, &["update"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Inserted: 0"));

    let output = run(&dir, &["validate"]);
    assert!(output.status.success());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_import_file_fails() {
    let dir = scratch_dir("missing");
    let output = run(&dir, &["import", dir.join("nope.csv").to_str().unwrap()]);
    assert!(!output.status.success());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn validate_passes_records_without_governor_data() {
    let dir = scratch_dir("nogov");
    let votes = dir.join("votes.csv");
    fs::write(
        &votes,
        "county,precinct,contest_name,election_date,party,vote_count\n\
         Wake,08,NC HOUSE 035,2022-11-08,DEM,1000\n\
         Wake,08,NC HOUSE 035,2022-11-08,REP,1020\n",
    )
    .unwrap();

    assert!(run(&dir, &["import", votes.to_str().unwrap()]).status.success());
    let output = run(&dir, &["update"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Inserted: 1"));

    let output = run(&dir, &["validate"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("missing_governor"));
    assert!(stdout.contains("0 errors, 1 warnings"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn validate_fails_on_stale_dva() {
    let dir = scratch_dir("stale");
    {
        let mut store = SqliteStore::open(&dir.join("flip.db")).unwrap();
        let record = FlippableRecord {
            county: "WAKE".to_string(),
            election_date: NaiveDate::from_ymd_opt(2022, 11, 8).unwrap(),
            precinct: "8".to_string(),
            contest_name: "NC HOUSE 035".to_string(),
            vote_for: 1,
            dem_votes: 1000,
            oppo_votes: 1020,
            gov_votes: 1200,
            dem_margin: -20,
            dva_pct_needed: 3.0,
            source_file: "vote_totals".to_string(),
            imported_at: Utc::now(),
        };
        store.insert_batch(&[record]).unwrap();
    }

    let output = run(&dir, &["validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("dva_mismatch"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn dry_run_does_not_create_the_database() {
    let dir = scratch_dir("dryrun");
    let output = run(&dir, &["update", "--dry-run"]);
    assert!(!output.status.success());
    assert!(!dir.join("flip.db").exists());
    let _ = fs::remove_dir_all(&dir);
}
