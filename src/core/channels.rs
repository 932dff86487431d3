use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::{FeatureVector, Sample};
use crate::error::{StreamError, StreamResult};

/// Channel layout of the CHB-MIT preprocessed export the classifier was fitted on
pub const DEFAULT_CHANNELS: [&str; 8] = [
    "FP1-F7", "C3-P3", "P3-O1", "P4-O2", "P7-O1", "P7-T7", "T8-P8-0", "T8-P8-1",
];

/// Fixed, ordered set of channel names shared by producer and consumer.
///
/// Order defines the feature-vector layout handed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelSet {
    names: Arc<[String]>,
}

impl ChannelSet {
    pub fn new<I, S>(names: I) -> StreamResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(StreamError::Config("channel set must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if name.trim().is_empty() {
                return Err(StreamError::Config("channel name must not be blank".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(StreamError::Config(format!("duplicate channel: {}", name)));
            }
        }

        Ok(Self { names: names.into() })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn index_of(&self, channel: &str) -> Option<usize> {
        self.names.iter().position(|name| name == channel)
    }

    /// Project a sample onto this layout; absent channels read as 0.0.
    pub fn project(&self, sample: &Sample) -> FeatureVector {
        self.names
            .iter()
            .map(|name| sample.get(name).unwrap_or(0.0))
            .collect::<Vec<_>>()
            .into()
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self {
            names: DEFAULT_CHANNELS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for ChannelSet {
    type Error = StreamError;

    fn try_from(names: Vec<String>) -> StreamResult<Self> {
        Self::new(names)
    }
}

impl From<ChannelSet> for Vec<String> {
    fn from(set: ChannelSet) -> Self {
        set.names.to_vec()
    }
}
