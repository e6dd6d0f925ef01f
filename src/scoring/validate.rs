use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::flippable::FlippableRecord;
use crate::votes::precinct::is_canonical_precinct;
use crate::votes::RaceKey;

/// Largest accepted gap between a stored and a recomputed DVA percentage.
pub const DVA_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DvaMismatch,
    MarginMismatch,
    NotRepHeld,
    MissingGovernor,
    NonCanonicalPrecinct,
    DuplicateKey,
}

impl IssueKind {
    /// Missing governor turnout is a data-completeness gap that `update`
    /// persists on purpose, so it never fails a validation run.
    pub fn severity(self) -> Severity {
        match self {
            Self::MissingGovernor => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::DvaMismatch => "dva_mismatch",
            Self::MarginMismatch => "margin_mismatch",
            Self::NotRepHeld => "not_rep_held",
            Self::MissingGovernor => "missing_governor",
            Self::NonCanonicalPrecinct => "non_canonical_precinct",
            Self::DuplicateKey => "duplicate_key",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub key: RaceKey,
    pub kind: IssueKind,
    pub severity: Severity,
    pub detail: String,
}

impl ValidationIssue {
    fn new(key: RaceKey, kind: IssueKind, detail: String) -> Self {
        Self {
            key,
            kind,
            severity: kind.severity(),
            detail,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub records_checked: usize,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no error-level issue was found. Warnings do not count.
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

/// Re-derives every persisted record and reports anything inconsistent.
pub fn validate_records(records: &[FlippableRecord]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut seen: BTreeMap<RaceKey, usize> = BTreeMap::new();

    for record in records {
        let key = record.key();
        *seen.entry(key.clone()).or_default() += 1;

        let expected_margin = record.dem_votes as i64 - record.oppo_votes as i64;
        if record.dem_margin != expected_margin {
            issues.push(ValidationIssue::new(
                key.clone(),
                IssueKind::MarginMismatch,
                format!("stored {} but votes give {expected_margin}", record.dem_margin),
            ));
        }
        if expected_margin >= 0 {
            issues.push(ValidationIssue::new(
                key.clone(),
                IssueKind::NotRepHeld,
                format!(
                    "dem {} vs oppo {} is not a Republican win",
                    record.dem_votes, record.oppo_votes
                ),
            ));
        }

        let recomputed = record.recomputed_dva_pct();
        if (recomputed - record.dva_pct_needed).abs() > DVA_TOLERANCE {
            issues.push(ValidationIssue::new(
                key.clone(),
                IssueKind::DvaMismatch,
                format!(
                    "stored {:.2} but recomputed {recomputed:.2}",
                    record.dva_pct_needed
                ),
            ));
        }
        if record.gov_votes == 0 {
            issues.push(ValidationIssue::new(
                key.clone(),
                IssueKind::MissingGovernor,
                "no governor turnout recorded".to_string(),
            ));
        }
        if !is_canonical_precinct(&record.precinct) {
            issues.push(ValidationIssue::new(
                key,
                IssueKind::NonCanonicalPrecinct,
                format!("precinct stored as {:?}", record.precinct),
            ));
        }
    }

    for (key, count) in seen {
        if count > 1 {
            issues.push(ValidationIssue::new(
                key,
                IssueKind::DuplicateKey,
                format!("{count} rows share this race"),
            ));
        }
    }

    ValidationReport {
        records_checked: records.len(),
        issues,
    }
}
