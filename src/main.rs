use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use flip_oracle::config::{Config, ConfigOverrides};
use flip_oracle::flippable::{insert_if_absent, plan_insertions, FlippableRecord};
use flip_oracle::import::read_vote_rows;
use flip_oracle::output::csv::{flippable_to_csv, records_to_csv};
use flip_oracle::output::json::render_json;
use flip_oracle::output::table::{
    render_analysis_stats, render_defensive_table, render_flippable_table,
    render_materialize_report, render_records_table, render_summary, render_validation_table,
};
use flip_oracle::scoring::analysis::{analyze_source, AnalysisOptions};
use flip_oracle::scoring::summary::summarize;
use flip_oracle::scoring::validate::validate_records;
use flip_oracle::scoring::AnalysisReport;
use flip_oracle::store::{FlippableSink, SqliteStore};
use flip_oracle::votes::parse_election_date;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(
    name = "flip-oracle",
    version,
    about = "Narrow-margin and DVA flippability scoring for precinct races"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    db: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args, Clone, Default)]
struct FilterArgs {
    #[arg(long = "max-margin")]
    max_margin: Option<f64>,
    #[arg(long = "min-votes")]
    min_votes: Option<u64>,
    #[arg(long)]
    county: Option<String>,
    #[arg(long)]
    contest: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load precinct vote rows from a CSV or NCSBE tab-delimited export.
    Import {
        file: PathBuf,
        #[arg(long = "election-date")]
        election_date: Option<String>,
    },
    /// Score Republican-held races without writing anything.
    Analyze {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        defensive: bool,
        #[arg(long = "export-csv")]
        export_csv: Option<PathBuf>,
    },
    /// Add newly flippable races to the flippable table.
    Update {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[arg(long = "export-csv")]
        export_csv: Option<PathBuf>,
    },
    Summary {
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    Validate,
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

impl Commands {
    fn filters(&self) -> Option<&FilterArgs> {
        match self {
            Commands::Analyze { filters, .. } | Commands::Update { filters, .. } => Some(filters),
            _ => None,
        }
    }

    fn is_dry_run(&self) -> bool {
        matches!(self, Commands::Update { dry_run: true, .. })
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    let filters = cli.command.filters().cloned().unwrap_or_default();
    config.apply_overrides(ConfigOverrides {
        db_path: cli.db.clone(),
        max_margin_pct: filters.max_margin,
        min_total_votes: filters.min_votes,
    })?;

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let db_path = config.resolved_db_path();
    let mut store = if cli.command.is_dry_run() {
        SqliteStore::open_read_only(&db_path)?
    } else {
        SqliteStore::open(&db_path)?
    };
    info!("using database {}", db_path.display());

    let options = AnalysisOptions {
        county: filters.county.clone(),
        contest_filter: filters.contest.clone(),
        ..config.analysis_options()
    };

    match &cli.command {
        Commands::Import {
            file,
            election_date,
        } => {
            let fallback_date = election_date
                .as_deref()
                .map(parse_election_date)
                .transpose()?;
            let rows = read_vote_rows(file, fallback_date)?;
            let stored = store.insert_vote_rows(&rows)?;
            println!("Imported {stored} vote rows from {}", file.display());
        }
        Commands::Analyze {
            defensive,
            export_csv,
            ..
        } => {
            let report = analyze_source(&store, &options)?;
            print_analysis(&report, *defensive, cli.output)?;
            if let Some(path) = export_csv {
                write_export(path, &flippable_to_csv(&report.flippable)?)?;
            }
        }
        Commands::Update {
            dry_run,
            export_csv,
            ..
        } => {
            let report = analyze_source(&store, &options)?;
            let existing = store.existing_keys()?;
            let plan = plan_insertions(
                &existing,
                &report.flippable,
                &config.export.source_label,
                Utc::now(),
            );
            if let Some(path) = export_csv {
                write_export(path, &records_to_csv(&plan.new_records)?)?;
            }
            if *dry_run {
                print_records(&plan.new_records, cli.output)?;
                println!(
                    "Dry run: {} records would be inserted, {} already present",
                    plan.new_records.len(),
                    plan.skipped()
                );
                return Ok(());
            }
            let outcome = insert_if_absent(&mut store, &plan)?;
            match cli.output {
                OutputFormat::Json => println!("{}", render_json(&outcome)?),
                _ => println!("{}", render_materialize_report(&outcome)),
            }
            if outcome.failed > 0 {
                warn!("{} records failed to insert", outcome.failed);
            }
        }
        Commands::Summary { top } => {
            let records = store.load_flippable()?;
            let summary = summarize(&records, *top);
            match cli.output {
                OutputFormat::Table => println!("{}", render_summary(&summary)),
                OutputFormat::Json => println!("{}", render_json(&summary)?),
                OutputFormat::Csv => {
                    warn!("CSV output for summary not implemented, using JSON");
                    println!("{}", render_json(&summary)?);
                }
            }
        }
        Commands::Validate => {
            let records = store.load_flippable()?;
            let report = validate_records(&records);
            match cli.output {
                OutputFormat::Table => println!("{}", render_validation_table(&report)),
                OutputFormat::Json => println!("{}", render_json(&report)?),
                OutputFormat::Csv => {
                    warn!("CSV output for validate not implemented, using JSON");
                    println!("{}", render_json(&report)?);
                }
            }
            if report.warning_count() > 0 {
                warn!("{} records carry validation warnings", report.warning_count());
            }
            if !report.is_clean() {
                return Err(anyhow!(
                    "flippable table has {} errors",
                    report.error_count()
                ));
            }
        }
        Commands::Config { .. } => unreachable!("config command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(init: bool, show: bool, config: &Config, config_path: &Path) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn write_export(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents)
        .with_context(|| format!("failed writing CSV export: {}", path.display()))?;
    info!("wrote CSV export to {}", path.display());
    Ok(())
}

fn print_analysis(report: &AnalysisReport, defensive: bool, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", render_flippable_table(&report.flippable));
            if defensive {
                println!("Defensive priorities:");
                println!("{}", render_defensive_table(&report.defensive));
            }
            println!(
                "{}",
                render_analysis_stats(&report.stats, report.flippable.len())
            );
        }
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Csv => println!("{}", flippable_to_csv(&report.flippable)?),
    }
    Ok(())
}

fn print_records(records: &[FlippableRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_records_table(records)),
        OutputFormat::Json => println!("{}", render_json(records)?),
        OutputFormat::Csv => println!("{}", records_to_csv(records)?),
    }
    Ok(())
}
