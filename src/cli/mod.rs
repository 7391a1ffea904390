/*
* Smart Water Plus command line
* -----------------------------
*
* smart-water-plus
* ├── serve [--port]          Run the prediction API
* ├── scan                    Scan simulation output for leaks
* │     [--network-results] [--cluster-flows] [--out] [--debounce]
* └── init [--force]          Write config/default.toml
*
* `--config <FILE>` replaces the CONFIG_PATH directory lookup with one file.
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};

use crate::config::Settings;
use crate::core::AlertKind;
use crate::monitoring::sink::{sample_lines, SAMPLE_LIMIT};
use crate::monitoring::{FileSink, ScanJob, ScanOutcome};

#[derive(Parser)]
#[command(name = "smart-water-plus")]
#[command(about = "Smart Water Plus leak detection toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Scan simulation output for leak anomalies
    Scan {
        /// Node pressure CSV
        #[arg(long, value_name = "FILE")]
        network_results: Option<PathBuf>,
        /// Cluster flow CSV
        #[arg(long, value_name = "FILE")]
        cluster_flows: Option<PathBuf>,
        /// Directory for leak_alerts.csv
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Also collapse consecutive alerts into events
        #[arg(long)]
        debounce: bool,
    },
    /// Generate default configuration
    Init {
        #[arg(short, long)]
        force: bool,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::new_from_file(path)?,
        None => Settings::new()?,
    };

    match cli.command {
        Commands::Serve { port } => {
            info!("Starting server on port {}", port.unwrap_or(settings.server.port));
            crate::api::run_server(settings, port).await?;
        }
        Commands::Scan {
            network_results,
            cluster_flows,
            out,
            debounce,
        } => {
            let network_results = network_results.unwrap_or_else(|| settings.data.network_results.clone());
            let cluster_flows = cluster_flows.unwrap_or_else(|| settings.data.cluster_flows.clone());
            let out = out.unwrap_or_else(|| settings.data.output_dir.clone());
            handle_scan_command(&settings, network_results, cluster_flows, out, debounce)?;
        }
        Commands::Init { force } => {
            handle_init_command(force)?;
        }
    }

    Ok(())
}

fn handle_scan_command(
    settings: &Settings,
    network_results: PathBuf,
    cluster_flows: PathBuf,
    out: PathBuf,
    debounce: bool,
) -> anyhow::Result<()> {
    let policy = settings
        .thresholds
        .policy()
        .context("invalid threshold configuration")?;
    let job = ScanJob::new(settings.village.clone(), policy).with_debounce(debounce);
    let mut sink = FileSink::new(out, settings.data.log_dir.clone());

    info!(
        "Scanning {} and {}",
        network_results.display(),
        cluster_flows.display()
    );
    let outcome = job
        .run_files(&network_results, &cluster_flows, &mut sink)
        .map_err(|e| {
            error!("Scan failed: {}", e);
            e
        })?;

    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &ScanOutcome) {
    println!("{} {}", "Scan".bold(), outcome.scan_id);

    if outcome.summary.total == 0 {
        println!("{} No anomalies detected", "✓".green());
    } else {
        println!(
            "{} {} anomalies ({}: {}, {}: {})",
            "!".red().bold(),
            outcome.summary.total,
            AlertKind::HighClusterFlow,
            outcome.summary.count(AlertKind::HighClusterFlow),
            AlertKind::LowPressure,
            outcome.summary.count(AlertKind::LowPressure),
        );
        for line in sample_lines(&outcome.log, SAMPLE_LIMIT) {
            println!("  {}", line.yellow());
        }
    }

    if let Some(events) = &outcome.events {
        println!("{} {} alert events after debouncing", "→".cyan(), events.len());
    }
    if let Some(path) = &outcome.alerts_path {
        println!("{} Alerts saved to {}", "✓".green(), path.display());
    }
    if let Some(path) = &outcome.report_path {
        println!("{} Report saved to {}", "✓".green(), path.display());
    }
}

fn handle_init_command(force: bool) -> anyhow::Result<()> {
    let config_dir = PathBuf::from("config");
    let config_file = config_dir.join("default.toml");
    if config_file.exists() && !force {
        error!("Configuration file already exists. Use --force to overwrite.");
        return Ok(());
    }

    std::fs::create_dir_all(&config_dir)?;
    let default_config = crate::config::generate_default_config();
    let config_str = toml::to_string_pretty(&default_config)?;
    std::fs::write(&config_file, config_str)?;

    println!("{} Default configuration generated at {}", "✓".green(), config_file.display());
    Ok(())
}
