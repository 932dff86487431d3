use serde::{Deserialize, Serialize};

/// Connection session lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Streaming,
    Closed,
    Failed { error_msg: String },
}

impl SessionPhase {
    /// Check if transition from current phase to target phase is valid
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        use SessionPhase::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Connecting) |

            // From Connecting
            (Connecting, Streaming) |
            (Connecting, Closed) |
            (Connecting, Failed { .. }) |

            // From Streaming
            (Streaming, Closed) |
            (Streaming, Failed { .. }) |

            // Explicit restart
            (Closed, Connecting) |
            (Failed { .. }, Connecting)
        )
    }

    /// Get human-readable phase name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Streaming => "Streaming",
            Self::Closed => "Closed",
            Self::Failed { .. } => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(SessionPhase::Idle.can_transition_to(&SessionPhase::Connecting));
        assert!(SessionPhase::Connecting.can_transition_to(&SessionPhase::Streaming));
        assert!(SessionPhase::Streaming.can_transition_to(&SessionPhase::Closed));
        assert!(!SessionPhase::Idle.can_transition_to(&SessionPhase::Streaming));
    }

    #[test]
    fn test_restart_only_through_connecting() {
        let failed = SessionPhase::Failed {
            error_msg: "reset".to_string(),
        };

        assert!(failed.can_transition_to(&SessionPhase::Connecting));
        assert!(!failed.can_transition_to(&SessionPhase::Streaming));
        assert!(!SessionPhase::Closed.can_transition_to(&SessionPhase::Streaming));
        assert!(failed.is_terminal());
    }
}
