//! CLI entry point for the QCEW district aggregation tool.
//!
//! Builds the quarterly store from historical files, refreshes it from the
//! QCEW API, regenerates the annual store and exports both as CSV.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use frd_qcew::{
    aggregation::aggregate_annual,
    config::Config,
    crosswalk::Crosswalk,
    fetch::BasicClient,
    output::write_csv,
    pipeline::{build_history, update_from_api},
    store::{load_store, save_store, AnnualStore, QuarterlyStore},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "frd_qcew")]
#[command(about = "Aggregates QCEW county data to Federal Reserve districts", long_about = None)]
struct Cli {
    /// Directory of historical QCEW CSV files (overrides QCEW_INPUT_DIR)
    #[arg(long, global = true)]
    input_dir: Option<PathBuf>,

    /// Output root for 01_json/ and 02_csv/ (overrides QCEW_OUTPUT_DIR)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// County-to-district crosswalk CSV (overrides QCEW_CROSSWALK)
    #[arg(long, global = true)]
    crosswalk: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the quarterly store from the historical input files
    Build,
    /// Refresh the current and previous year from the QCEW API
    Update {
        /// Year to treat as current (defaults to today's year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Regenerate the annual store from the quarterly store
    Annual,
    /// Write the quarterly and annual CSV exports
    Export,
    /// Build if needed, update, regenerate annual data and export
    Run {
        /// Year to treat as current (defaults to today's year)
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/frd_qcew.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("frd_qcew.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(path) = cli.crosswalk {
        config.crosswalk_path = path;
    }

    match cli.command {
        Commands::Build => {
            let crosswalk = load_crosswalk(&config)?;
            let store = build_history(&crosswalk, &config.input_dir)?;
            save_store(config.quarterly_json(), &store)?;
        }
        Commands::Update { year } => {
            let crosswalk = load_crosswalk(&config)?;
            update(&config, &crosswalk, year).await?;
        }
        Commands::Annual => {
            annual(&config)?;
        }
        Commands::Export => {
            export(&config)?;
        }
        Commands::Run { year } => {
            let crosswalk = load_crosswalk(&config)?;
            if !config.quarterly_json().exists() {
                info!("Quarterly store missing, building from history");
                let store = build_history(&crosswalk, &config.input_dir)?;
                save_store(config.quarterly_json(), &store)?;
            }
            update(&config, &crosswalk, year).await?;
            annual(&config)?;
            export(&config)?;
        }
    }

    Ok(())
}

fn load_crosswalk(config: &Config) -> Result<Crosswalk> {
    Crosswalk::load(&config.crosswalk_path)
        .with_context(|| format!("Failed to load crosswalk {}", config.crosswalk_path.display()))
}

/// Merges the latest API slices into the persisted quarterly store.
#[tracing::instrument(skip(config, crosswalk))]
async fn update(config: &Config, crosswalk: &Crosswalk, year: Option<i32>) -> Result<()> {
    let store: QuarterlyStore = load_store(config.quarterly_json())?;
    let current_year = year.unwrap_or_else(|| Utc::now().year());

    let client = BasicClient::new()?;
    let store = update_from_api(&client, &config.api_base_url, current_year, crosswalk, store).await?;

    save_store(config.quarterly_json(), &store)
}

fn annual(config: &Config) -> Result<()> {
    let quarterly: QuarterlyStore = load_store(config.quarterly_json())?;
    let annual = aggregate_annual(&quarterly);
    save_store(config.annual_json(), &annual)
}

fn export(config: &Config) -> Result<()> {
    let quarterly: QuarterlyStore = load_store(config.quarterly_json())?;
    write_csv(config.quarterly_csv(), &quarterly)?;

    let annual: AnnualStore = load_store(config.annual_json())?;
    write_csv(config.annual_csv(), &annual)?;
    Ok(())
}
