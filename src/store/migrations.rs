pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS vote_totals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    county TEXT NOT NULL,
    precinct TEXT NOT NULL,
    contest_name TEXT NOT NULL,
    election_date TEXT NOT NULL,
    party TEXT NOT NULL,
    vote_count INTEGER NOT NULL CHECK (vote_count >= 0),
    source_file TEXT,
    imported_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_vote_totals_race
    ON vote_totals(county, precinct, contest_name, election_date);

CREATE TABLE IF NOT EXISTS flippable (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    county TEXT NOT NULL,
    election_date TEXT NOT NULL,
    precinct TEXT NOT NULL,
    contest_name TEXT NOT NULL,
    vote_for INTEGER NOT NULL DEFAULT 1,
    dem_votes INTEGER NOT NULL,
    oppo_votes INTEGER NOT NULL,
    gov_votes INTEGER NOT NULL,
    dem_margin INTEGER NOT NULL,
    dva_pct_needed REAL NOT NULL,
    source_file TEXT NOT NULL,
    imported_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_flippable_race
    ON flippable(county, precinct, contest_name, election_date);
"#;
