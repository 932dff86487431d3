use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Delivered,
    Queued,
}

/// Alert channel, invoked only for seizure-positive outcomes
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<DeliveryStatus>;
}

/// Writes alerts to the structured log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(&self, message: &str) -> Result<DeliveryStatus> {
        warn!(alert = true, "{}", message);
        Ok(DeliveryStatus::Delivered)
    }
}
