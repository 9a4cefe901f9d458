//! optimm market-making engine, entry point.
//!
//! Runs against the in-memory exchange seeded from the `simulation` section
//! of the configuration.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use optimm_bot::AppConfig;

/// Options market-making engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via OPTIMM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Stop after this many quoting cycles
    #[arg(short, long)]
    iterations: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    optimm_telemetry::init_logging()?;

    info!("Starting optimm v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > OPTIMM_CONFIG env var > default
    let mut config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            AppConfig::from_file(&path)?
        }
        None => AppConfig::load()?,
    };
    if args.iterations.is_some() {
        config.runtime.iterations = args.iterations;
    }
    info!(
        instruments = config.instruments.len(),
        iterations = ?config.runtime.iterations,
        "Configuration loaded"
    );

    let exchange = optimm_bot::app::simulated_exchange(&config.simulation)?;
    let app = optimm_bot::Application::new(config, exchange)?;
    app.run().await?;

    Ok(())
}
