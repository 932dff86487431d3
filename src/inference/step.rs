use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::ModelService;
use crate::core::FeatureVector;
use crate::error::{StreamError, StreamResult};

/// Model output meaning "seizure"
pub const SEIZURE_OUTPUT: i64 = 0;
/// Model output meaning "no seizure"
pub const NO_SEIZURE_OUTPUT: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Seizure,
    NoSeizure,
}

impl Label {
    /// The only place the model's integer polarity is interpreted.
    pub fn from_model_output(raw: i64) -> StreamResult<Self> {
        match raw {
            SEIZURE_OUTPUT => Ok(Self::Seizure),
            NO_SEIZURE_OUTPUT => Ok(Self::NoSeizure),
            other => Err(StreamError::PredictionFailed(format!(
                "model returned unknown label {}",
                other
            ))),
        }
    }

    pub fn is_seizure(&self) -> bool {
        matches!(self, Self::Seizure)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Seizure => "The patient is affected by an epileptic seizure.",
            Self::NoSeizure => "The patient is not affected by an epileptic seizure.",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seizure => write!(f, "SEIZURE"),
            Self::NoSeizure => write!(f, "NO_SEIZURE"),
        }
    }
}

/// Labeled result of one prediction; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub label: Label,
    pub rendered_message: String,
    pub sequence_position: u64,
}

/// Runs a feature vector through the model service and labels the result.
///
/// Never retries; any model failure surfaces as `PredictionFailed`.
pub struct InferenceStep {
    model: Arc<dyn ModelService>,
    next_position: AtomicU64,
}

impl InferenceStep {
    pub fn new(model: Arc<dyn ModelService>) -> Self {
        Self {
            model,
            next_position: AtomicU64::new(0),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Position the next successful outcome will carry
    pub fn next_position(&self) -> u64 {
        self.next_position.load(Ordering::Acquire)
    }

    pub async fn infer(&self, features: &FeatureVector) -> StreamResult<InferenceOutcome> {
        let raw = self
            .model
            .predict(features)
            .await
            .map_err(|e| StreamError::PredictionFailed(format!("{:#}", e)))?;

        let label = Label::from_model_output(raw)?;
        let sequence_position = self.next_position.fetch_add(1, Ordering::AcqRel);

        Ok(InferenceOutcome {
            label,
            rendered_message: label.message().to_string(),
            sequence_position,
        })
    }
}
