use futures::SinkExt;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio::time::sleep;
use tokio_util::codec::{FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, info};

use super::Dataset;
use crate::codec::SampleCodec;
use crate::core::ChannelSet;
use crate::error::{StreamError, StreamResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProducerReport {
    pub messages_sent: u64,

    /// The consumer hung up before the dataset was exhausted
    pub peer_closed: bool,
}

/// Replays a dataset over one connection at a fixed cadence.
///
/// The interval is the only flow control; there is no retry.
pub struct ProducerLoop {
    codec: SampleCodec,
    interval: Duration,
}

impl ProducerLoop {
    pub fn new(channels: ChannelSet, interval: Duration) -> Self {
        Self {
            codec: SampleCodec::new(channels),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Send every row, then close the connection.
    ///
    /// A consumer that hangs up ends the loop normally; any other transport
    /// failure is returned to the caller.
    pub async fn run<T>(&mut self, dataset: &Dataset, io: T) -> StreamResult<ProducerReport>
    where
        T: AsyncWrite + Unpin,
    {
        let mut framed = FramedWrite::new(io, LinesCodec::new());
        let mut report = ProducerReport::default();

        for (index, row) in dataset.iter().enumerate() {
            let message = self.codec.encode(row)?;
            debug!(payload = %message, "Sending sample");

            if let Err(e) = framed.send(message).await {
                let err = classify(e);
                if err.is_clean_close() {
                    info!("Connection closed by client: {}", err);
                    report.peer_closed = true;
                    return Ok(report);
                }
                return Err(err);
            }

            report.messages_sent += 1;
            info!(row = index, "Sent sample");

            sleep(self.interval).await;
        }

        if let Err(e) = SinkExt::<String>::close(&mut framed).await {
            let err = classify(e);
            if !err.is_clean_close() {
                return Err(err);
            }
            report.peer_closed = true;
        }

        info!("Dataset exhausted after {} messages", report.messages_sent);
        Ok(report)
    }
}

fn classify(err: LinesCodecError) -> StreamError {
    match err {
        LinesCodecError::Io(e) => StreamError::from_send_failure(&e),
        LinesCodecError::MaxLineLengthExceeded => {
            StreamError::MalformedMessage("encoded sample exceeds maximum length".to_string())
        }
    }
}
