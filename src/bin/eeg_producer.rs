use anyhow::Result;
use clap::Parser;
use seizure_watch::config::StreamConfig;
use seizure_watch::producer::{Dataset, ProducerServer};
use seizure_watch::telemetry;
use std::path::PathBuf;
use tracing::info;

/// Replay an EEG dataset to one consumer at a time over TCP
#[derive(Parser, Debug)]
#[command(name = "eeg-producer", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV export to replay (overrides the configuration)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Pause between samples in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => StreamConfig::load(path).await?,
        None => StreamConfig::default(),
    };
    config.apply_env_overrides()?;

    if let Some(dataset) = cli.dataset {
        config.producer.dataset_path = Some(dataset);
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.producer.interval_ms = interval_ms;
    }
    config.validate()?;

    let dataset = Dataset::load_or_empty(config.producer.dataset_path.as_deref()).await;
    let server = ProducerServer::bind(&config, dataset).await?;
    info!(
        "Serving {} rows every {} ms",
        server.dataset().len(),
        config.producer.interval_ms
    );

    server
        .serve_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
