mod analyzer;
mod config;
mod loader;
mod model;
mod normalizer;
mod sample;
mod storage;
mod utils;

use analyzer::build_monitor_from_paths;
use clap::{Parser, Subcommand};
use config::{load_config, AppConfig};
use model::Result;
use std::path::PathBuf;
use std::process::ExitCode;
use storage::{write_csv, SqliteStorage};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "price-gap-monitor", about = "Price competitiveness monitor")]
struct Cli {
    /// JSON configuration file; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write seeded sample own-price and competitor CSVs
    Generate {
        #[arg(long)]
        seed: Option<u64>,
        /// Last generated date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        own: Option<PathBuf>,
        #[arg(long)]
        competitor: Option<PathBuf>,
    },
    /// Build the monitor and write it as CSV and SQLite
    Run {
        #[arg(long)]
        own: Option<PathBuf>,
        #[arg(long)]
        competitor: Option<PathBuf>,
        #[arg(long)]
        csv_out: Option<PathBuf>,
        #[arg(long)]
        db_out: Option<PathBuf>,
        /// Relative gap at or above which a row is ALTO_RISCO
        #[arg(long, allow_hyphen_values = true)]
        high: Option<f64>,
        /// Relative gap at or below which a row is ABAIXO_MERCADO
        #[arg(long, allow_hyphen_values = true)]
        low: Option<f64>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config.as_deref().map(load_config) {
        None => AppConfig::default(),
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            init_logging("info");
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);

    match execute(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Run failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn execute(command: Command, mut config: AppConfig) -> Result<()> {
    match command {
        Command::Generate {
            seed,
            end_date,
            own,
            competitor,
        } => {
            if let Some(seed) = seed {
                config.sample.seed = seed;
            }
            if end_date.is_some() {
                config.sample.end_date = end_date;
            }
            let own_path = own.unwrap_or(config.own_prices_path);
            let comp_path = competitor.unwrap_or(config.competitor_prices_path);

            info!("Generating sample data (seed {})...", config.sample.seed);
            let data = sample::generate(&config.sample)?;
            sample::write_sample(&data, &own_path, &comp_path)?;

            println!("Wrote: {}", own_path.display());
            println!("Wrote: {}", comp_path.display());
            println!(
                "Own rows: {} | Competitor rows: {}",
                data.own.len(),
                data.competitors.len()
            );
        }
        Command::Run {
            own,
            competitor,
            csv_out,
            db_out,
            high,
            low,
        } => {
            let mut thresholds = config.thresholds;
            if let Some(high) = high {
                thresholds.high = high;
            }
            if let Some(low) = low {
                thresholds.low = low;
            }
            thresholds.validate()?;

            let own_path = own.unwrap_or(config.own_prices_path);
            let comp_path = competitor.unwrap_or(config.competitor_prices_path);
            let csv_path = csv_out.unwrap_or(config.output_csv_path);
            let db_path = db_out.unwrap_or(config.output_db_path);

            info!(
                "Building monitor (high = {}, low = {})...",
                thresholds.high, thresholds.low
            );
            let monitor = build_monitor_from_paths(&own_path, &comp_path, &thresholds)?;
            if monitor.is_empty() {
                warn!("Own-price input has no rows; writing an empty monitor");
            }

            let mut db = SqliteStorage::new(&db_path)?;
            db.replace_monitor(&monitor)?;
            write_csv(&monitor, &csv_path)?;

            println!("Wrote: {}", db_path.display());
            println!("Wrote: {}", csv_path.display());
            let stored = db.risk_summary()?;
            let computed: Vec<(String, usize)> = monitor
                .risk_counts()
                .into_iter()
                .map(|(label, n)| (label.as_str().to_string(), n))
                .collect();
            if stored != computed {
                warn!("Stored label counts {:?} differ from computed {:?}", stored, computed);
            }

            println!("Rows: {} | Cols: {}", db.row_count()?, monitor.columns.len());
            for (label, count) in stored {
                println!("  {:<15} {}", label, count);
            }
        }
    }
    Ok(())
}
