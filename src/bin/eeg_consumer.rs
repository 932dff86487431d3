use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use seizure_watch::config::StreamConfig;
use seizure_watch::controller::{FetchController, StartOutcome};
use seizure_watch::core::FeatureVector;
use seizure_watch::inference::{InferenceStep, LinearModel, LogNotifier};
use seizure_watch::session::{SessionContext, SessionEvent, SessionPhase};
use seizure_watch::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

/// Classify streamed EEG samples for seizure activity
#[derive(Parser, Debug)]
#[command(name = "eeg-consumer", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serialized linear model (overrides the configuration)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to the producer and classify samples until Ctrl-C
    Stream {
        /// Do not raise alerts for seizure-positive outcomes
        #[arg(long)]
        no_notify: bool,
    },

    /// Classify one manually entered sample, in channel order
    Predict {
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },
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
    if let Some(model) = cli.model {
        config.consumer.model_path = Some(model);
    }
    config.validate()?;

    let model_path = config
        .consumer
        .model_path
        .clone()
        .context("No model configured; pass --model or set consumer.model_path")?;
    let model = Arc::new(LinearModel::load(&model_path).await?);

    match cli.command {
        Commands::Stream { no_notify } => {
            if no_notify {
                config.consumer.notify_on_seizure = false;
            }
            stream(&config, model).await
        }
        Commands::Predict { values } => predict(&config, model, values).await,
    }
}

async fn stream(config: &StreamConfig, model: Arc<LinearModel>) -> Result<()> {
    let mut controller = FetchController::new(config, model, Handle::current());
    if config.consumer.notify_on_seizure {
        controller = controller.with_notifier(Arc::new(LogNotifier));
    }

    let events = controller.events();
    let presented = controller.context();
    let presenter = std::thread::spawn(move || render(events, presented));

    if controller.start() != StartOutcome::Started {
        bail!("Session could not be started");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(config.consumer.poll_interval());

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted; stopping session");
                controller.shutdown().await;
                break;
            }
            _ = ticker.tick() => {
                if !controller.is_running() {
                    controller.join().await;
                    break;
                }
            }
        }
    }

    let phase = controller.phase();
    let context = controller.context();
    println!("\n{}", controller.monitor().generate_report());
    println!("Ledger holds {} outcomes", context.ledger.len());

    drop(controller);
    drop(context);
    let _ = presenter.join();

    match phase {
        SessionPhase::Failed { error_msg } => Err(anyhow!(error_msg)),
        _ => Ok(()),
    }
}

fn render(events: Receiver<SessionEvent>, context: Arc<SessionContext>) {
    for event in events.iter() {
        match event {
            SessionEvent::PhaseChanged(SessionPhase::Failed { error_msg }) => {
                eprintln!("Error occurred: {}", error_msg);
            }
            SessionEvent::PhaseChanged(phase) => println!("-- {} --", phase.name()),
            SessionEvent::Outcome(outcome) => {
                let snapshot = context.state.snapshot();
                let features = snapshot
                    .features
                    .iter()
                    .map(|(channel, value)| format!("{}={:.3}", channel, value))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!(
                    "[#{}] {}: {}\n    {}",
                    outcome.sequence_position, outcome.label, outcome.rendered_message, features
                );
            }
            SessionEvent::NotificationFailed(reason) => {
                eprintln!("Alert not delivered: {}", reason);
            }
        }
    }
}

async fn predict(config: &StreamConfig, model: Arc<LinearModel>, values: Vec<f64>) -> Result<()> {
    if values.len() != config.channels.len() {
        bail!(
            "Expected {} values ({}), got {}",
            config.channels.len(),
            config.channels.names().join(", "),
            values.len()
        );
    }

    let step = InferenceStep::new(model);
    let outcome = step.infer(&FeatureVector::from(values)).await?;
    println!("{}: {}", outcome.label, outcome.rendered_message);
    Ok(())
}
