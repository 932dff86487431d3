use std::io;
use thiserror::Error;

/// Failure taxonomy shared by the producer and consumer sides of the stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Payload was not a structured JSON object
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Peer-initiated or self-initiated graceful close
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Any other connectivity failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Model service raised or returned an unusable label
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// Dataset could not be read on the producer side
    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    /// A clean close is logged, never treated as a failed session.
    pub fn is_clean_close(&self) -> bool {
        matches!(self, Self::ConnectionClosed(_))
    }

    /// Classify a failed send: a peer that hung up is a clean close,
    /// everything else stays a transport error.
    pub fn from_send_failure(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => Self::ConnectionClosed(err.to_string()),
            _ => Self::Transport(err.to_string()),
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type StreamResult<T> = Result<T, StreamError>;
