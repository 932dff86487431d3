use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::core::{ChannelSet, FeatureVector, Sample};
use crate::inference::Label;

/// Copy of the session state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub features: Vec<(String, f64)>,
    pub is_fetching: bool,
    pub last_label: Option<Label>,
}

/// Current feature values, fetch flag and last label.
///
/// Only the streaming session writes feature values and labels; the fetch
/// flag is the single cross-task signal.
pub struct SessionState {
    channels: ChannelSet,
    features: RwLock<Vec<f64>>,
    is_fetching: AtomicBool,
    new_data: AtomicBool,
    last_label: RwLock<Option<Label>>,
}

impl SessionState {
    pub fn new(channels: ChannelSet) -> Self {
        let features = vec![0.0; channels.len()];
        Self {
            channels,
            features: RwLock::new(features),
            is_fetching: AtomicBool::new(false),
            new_data: AtomicBool::new(false),
            last_label: RwLock::new(None),
        }
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching.load(Ordering::Acquire)
    }

    pub fn set_fetching(&self, fetching: bool) {
        self.is_fetching.store(fetching, Ordering::Release);
    }

    /// Clear the fetch flag, returning whether it was set
    pub fn request_stop(&self) -> bool {
        self.is_fetching.swap(false, Ordering::AcqRel)
    }

    /// Zero every channel; called when a new session begins
    pub fn reset_features(&self) {
        let mut features = self
            .features
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        features.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Overwrite channels present in both the sample and the channel set.
    ///
    /// Returns how many channels were updated.
    pub fn apply(&self, sample: &Sample) -> usize {
        let mut features = self
            .features
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut updated = 0;
        for (slot, name) in features.iter_mut().zip(self.channels.iter()) {
            if let Some(value) = sample.get(name) {
                *slot = value;
                updated += 1;
            }
        }
        updated
    }

    pub fn feature_vector(&self) -> FeatureVector {
        self.features
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .into()
    }

    pub fn features(&self) -> Vec<(String, f64)> {
        let features = self
            .features
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.channels
            .iter()
            .map(str::to_string)
            .zip(features.iter().copied())
            .collect()
    }

    pub fn last_label(&self) -> Option<Label> {
        *self
            .last_label
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_last_label(&self, label: Label) {
        *self
            .last_label
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(label);
    }

    pub fn mark_new_data(&self) {
        self.new_data.store(true, Ordering::Release);
    }

    /// Consume the "new data available" mark
    pub fn take_new_data(&self) -> bool {
        self.new_data.swap(false, Ordering::AcqRel)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            features: self.features(),
            is_fetching: self.is_fetching(),
            last_label: self.last_label(),
        }
    }
}
