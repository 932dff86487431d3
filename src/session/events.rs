use super::SessionPhase;
use crate::inference::InferenceOutcome;

/// Messages handed from the session task to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Includes the failure reason when the session enters `Failed`
    PhaseChanged(SessionPhase),

    Outcome(InferenceOutcome),

    /// Alert could not be delivered; the session keeps streaming
    NotificationFailed(String),
}
