use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One decoded wire message: channel values plus the producer's timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Numeric fields keyed by channel name (no channel-set validation)
    pub values: HashMap<String, f64>,

    /// ISO-8601 timestamp, absent when the producer omitted it
    pub timestamp: Option<String>,
}

impl Sample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, channel: impl Into<String>, value: f64) {
        self.values.insert(channel.into(), value);
    }

    pub fn get(&self, channel: &str) -> Option<f64> {
        self.values.get(channel).copied()
    }
}

/// Ordered model input, laid out in channel-set order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl<const N: usize> From<[f64; N]> for FeatureVector {
    fn from(values: [f64; N]) -> Self {
        Self(values.to_vec())
    }
}

/// One dataset row as read by the producer, keyed by column name
pub type DatasetRow = HashMap<String, f64>;
