use serde_json::{Map, Value};
use tracing::trace;

use super::clock::{format_timestamp, MonotonicClock};
use crate::core::{ChannelSet, DatasetRow, Sample};
use crate::error::{StreamError, StreamResult};

/// Reserved wire key carrying the producer timestamp
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Serialize one row: exactly the channel-set keys plus `timestamp`.
///
/// Missing and non-finite source values are written as 0.0.
pub fn encode_row(row: &DatasetRow, channels: &ChannelSet, timestamp: &str) -> StreamResult<String> {
    let mut message = Map::with_capacity(channels.len() + 1);

    for channel in channels.iter() {
        let value = row
            .get(channel)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        message.insert(channel.to_string(), Value::from(value));
    }
    message.insert(TIMESTAMP_KEY.to_string(), Value::String(timestamp.to_string()));

    serde_json::to_string(&Value::Object(message))
        .map_err(|e| StreamError::MalformedMessage(format!("failed to encode sample: {}", e)))
}

/// Parse one wire message.
///
/// Only structural failures are errors; absent channels and unknown keys
/// are accepted so that either side can evolve its channel layout.
pub fn decode(payload: &str) -> StreamResult<Sample> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| StreamError::MalformedMessage(e.to_string()))?;

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(StreamError::MalformedMessage(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut sample = Sample::new();
    for (key, field) in fields {
        if key == TIMESTAMP_KEY {
            if let Value::String(ts) = field {
                sample.timestamp = Some(ts);
            }
            continue;
        }

        match field.as_f64() {
            Some(v) => sample.insert(key, v),
            None => trace!("Ignoring non-numeric field {}", key),
        }
    }

    Ok(sample)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Stateful encoder used by the producer loop.
///
/// Owns the clock so timestamps are non-decreasing across one stream.
pub struct SampleCodec {
    channels: ChannelSet,
    clock: MonotonicClock,
}

impl SampleCodec {
    pub fn new(channels: ChannelSet) -> Self {
        Self {
            channels,
            clock: MonotonicClock::new(),
        }
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn encode(&mut self, row: &DatasetRow) -> StreamResult<String> {
        let timestamp = format_timestamp(&self.clock.now());
        encode_row(row, &self.channels, &timestamp)
    }

    pub fn decode(&self, payload: &str) -> StreamResult<Sample> {
        decode(payload)
    }
}
