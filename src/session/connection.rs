use crossbeam_channel::Sender;
use futures::{SinkExt, StreamExt};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use super::{SessionContext, SessionEvent, SessionPhase};
use crate::codec;
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::inference::{InferenceStep, NotificationSink};

/// Transport and timing knobs for one consumer connection
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub poll_interval: Duration,
    pub idle_timeout: Duration,
    pub max_message_bytes: usize,
}

impl SessionSettings {
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            endpoint: config.endpoint.address(),
            connect_timeout: config.consumer.connect_timeout(),
            poll_interval: config.consumer.poll_interval(),
            idle_timeout: config.consumer.idle_timeout(),
            max_message_bytes: config.consumer.max_message_bytes,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&StreamConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    StopRequested,
    PeerClosed,
}

/// One consumer-side connection: connect, receive, infer, record.
///
/// Never reconnects; a terminal phase always releases the transport and
/// clears the fetch flag so only an explicit start can resume.
pub struct ConnectionSession {
    context: Arc<SessionContext>,
    inference: Arc<InferenceStep>,
    notifier: Option<Arc<dyn NotificationSink>>,
    events: Sender<SessionEvent>,
    settings: SessionSettings,
}

impl ConnectionSession {
    pub fn new(
        context: Arc<SessionContext>,
        inference: Arc<InferenceStep>,
        events: Sender<SessionEvent>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            context,
            inference,
            notifier: None,
            events,
            settings,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Connect to the configured producer endpoint and stream until a
    /// terminal phase is reached
    pub async fn run(self) -> SessionPhase {
        self.begin();

        let endpoint = self.settings.endpoint.clone();
        let stream = match timeout(self.settings.connect_timeout, TcpStream::connect(endpoint.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return self.fail(StreamError::Transport(format!(
                    "connect to {} failed: {}",
                    endpoint, e
                )))
            }
            Err(_) => {
                return self.fail(StreamError::Transport(format!(
                    "connect to {} timed out after {:?}",
                    endpoint, self.settings.connect_timeout
                )))
            }
        };

        info!("Connected to producer at {}", endpoint);
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Could not set TCP_NODELAY: {}", e);
        }

        self.stream(stream).await
    }

    /// Stream over an already established transport
    pub async fn run_with_transport<T>(self, io: T) -> SessionPhase
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        self.begin();
        self.stream(io).await
    }

    fn begin(&self) {
        self.context.metrics.record_session_start();
        self.enter(SessionPhase::Connecting);
    }

    async fn stream<T>(self, io: T) -> SessionPhase
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        if !self.context.state.is_fetching() {
            info!("Stop requested before streaming began");
            return self.finish(SessionPhase::Closed);
        }

        self.enter(SessionPhase::Streaming);

        let codec = LinesCodec::new_with_max_length(self.settings.max_message_bytes);
        let mut framed = Framed::new(io, codec);

        let result = self.receive_loop(&mut framed).await;

        // Release the transport on every exit path
        if let Err(e) = SinkExt::<String>::close(&mut framed).await {
            debug!("Transport close reported: {}", e);
        }
        drop(framed);

        match result {
            Ok(CloseReason::StopRequested) => {
                info!("Session stopped on request");
                self.finish(SessionPhase::Closed)
            }
            Ok(CloseReason::PeerClosed) => {
                info!("Producer closed the connection");
                self.finish(SessionPhase::Closed)
            }
            Err(e) => self.fail(e),
        }
    }

    async fn receive_loop<T>(&self, framed: &mut Framed<T, LinesCodec>) -> StreamResult<CloseReason>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let mut last_message = Instant::now();

        loop {
            if !self.context.state.is_fetching() {
                return Ok(CloseReason::StopRequested);
            }

            let line = match timeout(self.settings.poll_interval, framed.next()).await {
                Err(_) => {
                    if last_message.elapsed() >= self.settings.idle_timeout {
                        return Err(StreamError::Transport(format!(
                            "no message from producer within {:?}",
                            self.settings.idle_timeout
                        )));
                    }
                    continue;
                }
                Ok(None) => return Ok(CloseReason::PeerClosed),
                Ok(Some(Err(e))) => return Err(map_codec_error(e)),
                Ok(Some(Ok(line))) => line,
            };

            last_message = Instant::now();

            // A stop that raced the receive wins; nothing more is recorded
            if !self.context.state.is_fetching() {
                return Ok(CloseReason::StopRequested);
            }

            if line.trim().is_empty() {
                debug!("Skipping blank line");
                continue;
            }

            self.handle_message(&line).await?;
        }
    }

    async fn handle_message(&self, line: &str) -> StreamResult<()> {
        let sample = codec::decode(line)?;
        self.context.metrics.record_sample();

        let updated = self.context.state.apply(&sample);
        debug!(
            updated,
            timestamp = sample.timestamp.as_deref().unwrap_or("-"),
            "Sample received"
        );

        let features = self.context.state.feature_vector();
        let start = self.context.metrics.start_inference();
        let outcome = self.inference.infer(&features).await?;
        self.context.metrics.finish_inference(start);

        self.context.state.set_last_label(outcome.label);
        self.context.ledger.append(outcome.clone());
        self.context.metrics.record_outcome(outcome.label.is_seizure());
        self.context.state.mark_new_data();

        info!(
            position = outcome.sequence_position,
            label = %outcome.label,
            "Outcome recorded"
        );

        let seizure = outcome.label.is_seizure();
        let message = outcome.rendered_message.clone();
        self.emit(SessionEvent::Outcome(outcome));

        if seizure {
            if let Some(notifier) = &self.notifier {
                match notifier.notify(&message).await {
                    Ok(status) => debug!("Seizure alert {:?}", status),
                    Err(e) => {
                        warn!("Seizure alert not delivered: {:#}", e);
                        self.emit(SessionEvent::NotificationFailed(format!("{:#}", e)));
                    }
                }
            }
        }

        Ok(())
    }

    fn enter(&self, phase: SessionPhase) {
        if let Err(e) = self.context.transition_to(phase.clone()) {
            warn!("{}", e);
            self.context.set_phase(phase.clone());
        }
        debug!("Session phase: {}", phase.name());
        self.emit(SessionEvent::PhaseChanged(phase));
    }

    fn fail(&self, err: StreamError) -> SessionPhase {
        error!("Session failed: {}", err);
        self.context.metrics.record_error();
        self.finish(SessionPhase::Failed {
            error_msg: err.to_string(),
        })
    }

    fn finish(&self, phase: SessionPhase) -> SessionPhase {
        self.context.state.set_fetching(false);
        self.enter(phase.clone());
        phase
    }

    fn emit(&self, event: SessionEvent) {
        // The presentation layer may have gone away; the session does not care
        let _ = self.events.send(event);
    }
}

fn map_codec_error(err: LinesCodecError) -> StreamError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => {
            StreamError::MalformedMessage("message exceeds maximum length".to_string())
        }
        LinesCodecError::Io(e) if e.kind() == io::ErrorKind::InvalidData => {
            StreamError::MalformedMessage(e.to_string())
        }
        LinesCodecError::Io(e) => StreamError::Transport(e.to_string()),
    }
}
