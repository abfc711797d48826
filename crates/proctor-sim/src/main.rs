//! proctor-sim - replay proctoring scenarios from the command line

use anyhow::Context;
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use proctor::Settings;
use proctor_sim::{init_logging, run_scenario, Scenario};
use std::path::PathBuf;
use tracing::info;

/// Interview monitor scenario simulator
#[derive(Parser)]
#[command(name = "proctor-sim")]
#[command(version)]
#[command(about = "Replay camera and focus scenarios against the interview monitor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file and print a JSON report
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Settings file (TOML); PROCTOR__* variables override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print Prometheus metrics to stderr after the run
        #[arg(long)]
        metrics: bool,

        /// Debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            config,
            metrics,
            verbose,
        } => {
            let settings = Settings::load(config.as_deref()).context("loading settings")?;
            init_logging(&settings.logging, verbose)?;
            info!("=== proctor-sim v{} ===", env!("CARGO_PKG_VERSION"));

            let recorder = if metrics {
                Some(
                    PrometheusBuilder::new()
                        .install_recorder()
                        .context("installing metrics recorder")?,
                )
            } else {
                None
            };

            let scenario = Scenario::load(&scenario)
                .with_context(|| format!("reading scenario {}", scenario.display()))?;
            let report = run_scenario(&scenario, settings.monitor)?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(handle) = recorder {
                eprintln!("{}", handle.render());
            }
        }
    }

    Ok(())
}
