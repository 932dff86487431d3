use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::core::ChannelSet;
use crate::error::{StreamError, StreamResult};

/// Well-known producer endpoint, shared by both sides of the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
}

impl EndpointConfig {
    /// `host:port`, suitable for both bind and connect
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Pause between two emitted samples
    pub interval_ms: u64,

    /// CSV export to replay; `None` serves an empty dataset
    pub dataset_path: Option<PathBuf>,
}

impl ProducerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            dataset_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    pub connect_timeout_ms: u64,

    /// Upper bound on how long a stop request can go unobserved
    pub poll_interval_ms: u64,

    /// Silence from the producer longer than this fails the session
    pub idle_timeout_ms: u64,

    /// Most recent outcomes retained by the result ledger
    pub ledger_capacity: usize,

    pub max_message_bytes: usize,

    pub notify_on_seizure: bool,

    /// Serialized `LinearModel`
    pub model_path: Option<PathBuf>,
}

impl ConsumerConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            poll_interval_ms: 250,
            idle_timeout_ms: 60_000,
            ledger_capacity: 500,
            max_message_bytes: 64 * 1024,
            notify_on_seizure: true,
            model_path: None,
        }
    }
}

/// Top-level configuration for producer and consumer binaries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub endpoint: EndpointConfig,
    pub producer: ProducerConfig,
    pub consumer: ConsumerConfig,
    pub channels: ChannelSet,
}

impl StreamConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: Self = serde_json::from_value(config).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOST` / `PORT` from the process environment
    pub fn apply_env_overrides(&mut self) -> StreamResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> StreamResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.endpoint.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.endpoint.port = port
                .trim()
                .parse()
                .map_err(|_| StreamError::Config(format!("invalid PORT: {}", port)))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> StreamResult<()> {
        if self.endpoint.host.trim().is_empty() {
            return Err(StreamError::Config("endpoint host must not be empty".to_string()));
        }
        if self.producer.interval_ms == 0 {
            return Err(StreamError::Config("producer interval_ms must be positive".to_string()));
        }

        let consumer = &self.consumer;
        if consumer.connect_timeout_ms == 0 {
            return Err(StreamError::Config("connect_timeout_ms must be positive".to_string()));
        }
        if consumer.poll_interval_ms == 0 {
            return Err(StreamError::Config("poll_interval_ms must be positive".to_string()));
        }
        if consumer.idle_timeout_ms < consumer.poll_interval_ms {
            return Err(StreamError::Config(
                "idle_timeout_ms must not be shorter than poll_interval_ms".to_string(),
            ));
        }
        if consumer.ledger_capacity == 0 {
            return Err(StreamError::Config("ledger_capacity must be positive".to_string()));
        }
        if consumer.max_message_bytes == 0 {
            return Err(StreamError::Config("max_message_bytes must be positive".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StreamConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoint.address(), "127.0.0.1:8000");
        assert_eq!(config.producer.interval(), Duration::from_secs(10));
        assert_eq!(config.consumer.ledger_capacity, 500);
    }

    #[test]
    fn test_port_override() {
        let mut config = StreamConfig::default();
        config
            .apply_overrides(|key| match key {
                "HOST" => Some("0.0.0.0".to_string()),
                "PORT" => Some("9100".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.endpoint.address(), "0.0.0.0:9100");

        let bad = config.apply_overrides(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert!(bad.is_err());
    }
}
