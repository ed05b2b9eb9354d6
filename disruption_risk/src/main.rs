//! Disruption risk experiment runner
//!
//! Usage:
//!   cargo run --release -p disruption_risk -- experiments/baseline.toml
//!   cargo run --release -p disruption_risk -- experiments/baseline.toml --request request.json --seed 42

use anyhow::Context;
use clap::Parser;
use disruption_risk::api::{ErrorBody, SimulationRequest, Simulator};
use disruption_risk::config::ExperimentConfig;
use disruption_risk::history::OrderHistory;
use disruption_risk::DistributionFitter;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Monte-Carlo projection of supply-chain disruption costs")]
struct Args {
    /// Experiment configuration (TOML)
    config: PathBuf,

    /// JSON request overriding the experiment settings
    #[arg(long)]
    request: Option<PathBuf>,

    /// Seed overriding the request and experiment
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ExperimentConfig::from_path(&args.config)
        .with_context(|| format!("loading experiment config {}", args.config.display()))?;
    tracing::info!(experiment = %config.experiment.name, "starting experiment");

    let history = match &config.data.orders_csv {
        Some(path) => OrderHistory::from_path(path)
            .with_context(|| format!("loading order history {}", path.display()))?,
        None => OrderHistory::default(),
    };

    let mut request = match &args.request {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading request {}", path.display()))?;
            serde_json::from_str::<SimulationRequest>(&text)
                .with_context(|| format!("parsing request {}", path.display()))?
        }
        None => config.to_request(),
    };
    if args.seed.is_some() {
        request.seed = args.seed;
    }

    let fitter = DistributionFitter::new(config.fitter)?;
    let simulator = Simulator::new(history, fitter, config.execution.clone());

    let body = match simulator.simulate(&request) {
        Ok(response) => serde_json::to_string_pretty(&response)?,
        Err(err) => {
            if err.is_client_error() {
                tracing::warn!(%err, "request rejected");
            } else {
                tracing::error!(%err, "simulation failed");
            }
            let body = serde_json::to_string_pretty(&ErrorBody::from(&err))?;
            println!("{body}");
            return Err(err).context("simulation request failed");
        }
    };

    match &config.data.output_json {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote simulation response");
        }
        None => println!("{body}"),
    }

    Ok(())
}
