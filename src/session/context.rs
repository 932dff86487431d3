use anyhow::{anyhow, Result};
use std::sync::{Arc, RwLock};

use super::{SessionPhase, SessionState};
use crate::core::ChannelSet;
use crate::ledger::ResultLedger;
use crate::observability::{SessionMetrics, SessionMonitor};

/// Everything a streaming session reads and writes, passed around explicitly.
///
/// Owned by the fetch controller and shared with the session task.
pub struct SessionContext {
    pub state: SessionState,
    pub ledger: ResultLedger,
    pub metrics: Arc<SessionMetrics>,
    phase: RwLock<SessionPhase>,
}

impl SessionContext {
    pub fn new(channels: ChannelSet, ledger_capacity: usize) -> Self {
        Self {
            state: SessionState::new(channels),
            ledger: ResultLedger::new(ledger_capacity),
            metrics: Arc::new(SessionMetrics::new()),
            phase: RwLock::new(SessionPhase::Idle),
        }
    }

    pub fn channels(&self) -> &ChannelSet {
        self.state.channels()
    }

    /// Get current session phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Set session phase directly (without validation)
    pub fn set_phase(&self, new_phase: SessionPhase) {
        *self
            .phase
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = new_phase;
    }

    /// Transition to a new phase with validation
    pub fn transition_to(&self, new_phase: SessionPhase) -> Result<()> {
        let mut phase = self
            .phase
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !phase.can_transition_to(&new_phase) {
            return Err(anyhow!(
                "Invalid phase transition: {} -> {}",
                phase.name(),
                new_phase.name()
            ));
        }
        *phase = new_phase;
        Ok(())
    }

    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor::new(self.metrics.clone())
    }
}
