use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::StreamConfig;
use crate::inference::{InferenceStep, ModelService, NotificationSink};
use crate::observability::SessionMonitor;
use crate::session::{ConnectionSession, SessionContext, SessionEvent, SessionPhase, SessionSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartOutcome {
    /// A new connection session was spawned
    Started,
    /// A session is already connecting or streaming
    AlreadyRunning,
    /// The previous session is still releasing its transport
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopOutcome {
    /// Stop was signalled to the running session
    Stopping,
    NotRunning,
}

/// Start/stop supervisor for the streaming session.
///
/// Guarantees at most one live connection session per context. Both
/// operations are non-blocking and safe to call from a UI thread.
pub struct FetchController {
    context: Arc<SessionContext>,
    inference: Arc<InferenceStep>,
    notifier: Option<Arc<dyn NotificationSink>>,
    settings: SessionSettings,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
    task: Mutex<Option<JoinHandle<SessionPhase>>>,
    runtime: Handle,
}

impl FetchController {
    pub fn new(config: &StreamConfig, model: Arc<dyn ModelService>, runtime: Handle) -> Self {
        let (events_tx, events_rx) = unbounded();

        Self {
            context: Arc::new(SessionContext::new(
                config.channels.clone(),
                config.consumer.ledger_capacity,
            )),
            inference: Arc::new(InferenceStep::new(model)),
            notifier: None,
            settings: SessionSettings::from_config(config),
            events_tx,
            events_rx,
            task: Mutex::new(None),
            runtime,
        }
    }

    /// Alert sink used for seizure-positive outcomes
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn context(&self) -> Arc<SessionContext> {
        self.context.clone()
    }

    pub fn inference(&self) -> Arc<InferenceStep> {
        self.inference.clone()
    }

    /// Session events; each event is delivered to exactly one receiver
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.events_rx.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.context.phase()
    }

    pub fn monitor(&self) -> SessionMonitor {
        self.context.monitor()
    }

    /// Whether a session task is alive (including one that is stopping)
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawn a connection session unless one is already alive
    pub fn start(&self) -> StartOutcome {
        let mut task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                return if self.context.state.is_fetching() {
                    StartOutcome::AlreadyRunning
                } else {
                    StartOutcome::Stopping
                };
            }
        }

        self.context.state.reset_features();
        self.context.state.set_fetching(true);

        let mut session = ConnectionSession::new(
            self.context.clone(),
            self.inference.clone(),
            self.events_tx.clone(),
            self.settings.clone(),
        );
        if let Some(notifier) = &self.notifier {
            session = session.with_notifier(notifier.clone());
        }

        *task = Some(self.runtime.spawn(session.run()));
        info!(
            model = self.inference.model_name(),
            "Fetching started against {}",
            self.settings.endpoint
        );

        StartOutcome::Started
    }

    /// Ask the running session to close at its next receive boundary
    pub fn stop(&self) -> StopOutcome {
        if self.context.state.request_stop() {
            info!("Fetching stop requested");
            StopOutcome::Stopping
        } else {
            StopOutcome::NotRunning
        }
    }

    /// Wait for the current session task to reach its terminal phase
    pub async fn join(&self) -> Option<SessionPhase> {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()?;

        match handle.await {
            Ok(phase) => Some(phase),
            Err(e) => {
                warn!("Session task ended abnormally: {}", e);
                self.context.state.set_fetching(false);
                let phase = SessionPhase::Failed {
                    error_msg: format!("session task ended abnormally: {}", e),
                };
                self.context.set_phase(phase.clone());
                Some(phase)
            }
        }
    }

    /// Stop and wait for the transport to be released
    pub async fn shutdown(&self) -> Option<SessionPhase> {
        self.stop();
        self.join().await
    }
}

/// Note: dropping cannot await the session task; it only signals stop.
impl Drop for FetchController {
    fn drop(&mut self) {
        self.context.state.request_stop();
    }
}
