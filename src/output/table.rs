use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::flippable::{FlippableRecord, MaterializeReport};
use crate::scoring::summary::DvaSummary;
use crate::scoring::validate::{Severity, ValidationReport};
use crate::scoring::{AnalysisStats, DvaTier, TieredRace};
use crate::votes::{RaceResult, DATE_FORMAT};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn tier_color(tier: DvaTier) -> Color {
    match tier {
        DvaTier::HighlyFlippable => Color::Green,
        DvaTier::Flippable => Color::Cyan,
        DvaTier::Competitive => Color::Yellow,
        DvaTier::StretchTarget => Color::Magenta,
        DvaTier::Difficult => Color::Red,
    }
}

fn format_dva(dva_pct_needed: f64, feasible: bool) -> String {
    if feasible {
        format!("{dva_pct_needed:.1}%")
    } else {
        "n/a".to_string()
    }
}

pub fn render_flippable_table(races: &[TieredRace]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Rank",
        "County",
        "Precinct",
        "Contest",
        "Date",
        "Dem",
        "Rep",
        "Margin",
        "Gov Dem",
        "Absent",
        "DVA Needed",
        "DVA Tier",
        "Margin Tier",
        "Pathway",
    ]);

    for (idx, t) in races.iter().enumerate() {
        let race = &t.race;
        table.add_row(Row::from(vec![
            Cell::new(idx + 1),
            Cell::new(&race.key.county),
            Cell::new(&race.key.precinct),
            Cell::new(&race.key.contest_name),
            Cell::new(race.key.election_date.format(DATE_FORMAT)),
            Cell::new(race.dem_votes),
            Cell::new(race.rep_votes),
            Cell::new(format!("{:.2}%", race.margin_pct)),
            Cell::new(format!("{} ({})", t.gov_votes, t.governor_source)),
            Cell::new(t.dem_absenteeism.max(0)),
            Cell::new(format_dva(t.dva_pct_needed, t.is_mobilization_feasible())),
            Cell::new(t.dva_tier).fg(tier_color(t.dva_tier)),
            Cell::new(t.margin_tier),
            Cell::new(t.pathway),
        ]));
    }
    table.to_string()
}

pub fn render_defensive_table(races: &[RaceResult]) -> String {
    let mut table = new_table();
    table.set_header(vec!["County", "Precinct", "Contest", "Date", "Dem", "Rep", "Margin"]);
    for race in races {
        table.add_row(vec![
            race.key.county.clone(),
            race.key.precinct.clone(),
            race.key.contest_name.clone(),
            race.key.election_date.format(DATE_FORMAT).to_string(),
            race.dem_votes.to_string(),
            race.rep_votes.to_string(),
            format!("{:.2}%", race.margin_pct),
        ]);
    }
    table.to_string()
}

pub fn render_analysis_stats(stats: &AnalysisStats, flippable: usize) -> String {
    format!(
        "Races considered: {}\nFlippable: {flippable}\nTies skipped: {}\nBelow vote floor: {}\n\
         Above margin cap: {}\nFiltered out: {}\nGovernor contests (reference): {}\n\
         Targets without governor data: {}",
        stats.races_considered,
        stats.ties_skipped,
        stats.below_min_votes,
        stats.above_max_margin,
        stats.filtered_out,
        stats.reference_contests,
        stats.missing_governor
    )
}

pub fn render_records_table(records: &[FlippableRecord]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "County",
        "Date",
        "Precinct",
        "Contest",
        "Dem",
        "Oppo",
        "Gov Dem",
        "Dem Margin",
        "DVA Needed",
        "Source",
    ]);
    for r in records {
        let tier = r.dva_tier();
        table.add_row(Row::from(vec![
            Cell::new(&r.county),
            Cell::new(r.election_date.format(DATE_FORMAT)),
            Cell::new(&r.precinct),
            Cell::new(&r.contest_name),
            Cell::new(r.dem_votes),
            Cell::new(r.oppo_votes),
            Cell::new(r.gov_votes),
            Cell::new(r.dem_margin),
            Cell::new(format_dva(r.dva_pct_needed, r.is_mobilization_feasible()))
                .fg(tier_color(tier)),
            Cell::new(&r.source_file),
        ]));
    }
    table.to_string()
}

pub fn render_materialize_report(report: &MaterializeReport) -> String {
    format!(
        "Inserted: {}\nSkipped (already present): {}\nFailed: {}",
        report.inserted, report.skipped, report.failed
    )
}

pub fn render_summary(summary: &DvaSummary) -> String {
    let mut tiers = new_table();
    tiers.set_header(vec!["DVA Tier", "Races"]);
    for count in &summary.by_tier {
        tiers.add_row(Row::from(vec![
            Cell::new(count.tier).fg(tier_color(count.tier)),
            Cell::new(count.races),
        ]));
    }

    let mut counties = new_table();
    counties.set_header(vec!["County", "Races", "Highly Flippable", "Best DVA"]);
    for county in &summary.by_county {
        counties.add_row(vec![
            county.county.clone(),
            county.races.to_string(),
            county.highly_flippable.to_string(),
            county
                .best_dva_pct
                .map_or_else(|| "n/a".to_string(), |dva| format_dva(dva, true)),
        ]);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Flippable races: {}\nMobilization feasible: {}\nMissing governor data: {}\n",
        summary.total_races, summary.mobilization_feasible, summary.missing_governor
    ));
    out.push_str(&tiers.to_string());
    out.push('\n');
    out.push_str(&counties.to_string());
    if !summary.easiest.is_empty() {
        out.push_str("\nEasiest targets:\n");
        out.push_str(&render_records_table(&summary.easiest));
    }
    out
}

pub fn render_validation_table(report: &ValidationReport) -> String {
    if report.issues.is_empty() {
        return format!("{} records checked, no issues found.", report.records_checked);
    }
    let mut table = new_table();
    table.set_header(vec!["Race", "Severity", "Issue", "Detail"]);
    for issue in &report.issues {
        let color = match issue.severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
        };
        table.add_row(Row::from(vec![
            Cell::new(&issue.key),
            Cell::new(issue.severity).fg(color),
            Cell::new(issue.kind).fg(color),
            Cell::new(&issue.detail),
        ]));
    }
    format!(
        "{}\n{} records checked, {} errors, {} warnings",
        table,
        report.records_checked,
        report.error_count(),
        report.warning_count()
    )
}
