use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use super::{Dataset, ProducerLoop, ProducerReport};
use crate::config::StreamConfig;
use crate::core::ChannelSet;
use crate::error::StreamResult;

/// Accepts consumers on the well-known endpoint and serves them one at a
/// time, each from the first dataset row
pub struct ProducerServer {
    listener: TcpListener,
    dataset: Arc<Dataset>,
    channels: ChannelSet,
    interval: Duration,
}

impl ProducerServer {
    pub async fn bind(config: &StreamConfig, dataset: Dataset) -> Result<Self> {
        let address = config.endpoint.address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind producer endpoint {}", address))?;

        Ok(Self::from_listener(
            listener,
            dataset,
            config.channels.clone(),
            config.producer.interval(),
        ))
    }

    pub fn from_listener(
        listener: TcpListener,
        dataset: Dataset,
        channels: ChannelSet,
        interval: Duration,
    ) -> Self {
        Self {
            listener,
            dataset: Arc::new(dataset),
            channels,
            interval,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Accept and fully serve exactly one consumer
    pub async fn serve_one(&self) -> Result<StreamResult<ProducerReport>> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(self.handle(stream, peer).await)
    }

    /// Serve consumers sequentially until `shutdown` resolves
    pub async fn serve_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let address = self.local_addr()?;
        info!("Producer listening on {}", address);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Producer shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };

                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Producer shutting down during connection from {}", peer);
                            return Ok(());
                        }
                        _ = self.handle(stream, peer) => {}
                    }
                }
            }
        }
    }

    pub async fn serve(self) -> Result<()> {
        self.serve_until(std::future::pending()).await
    }

    async fn handle(&self, stream: TcpStream, peer: SocketAddr) -> StreamResult<ProducerReport> {
        info!("New client connection established: {}", peer);
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not set TCP_NODELAY for {}: {}", peer, e);
        }

        let mut producer = ProducerLoop::new(self.channels.clone(), self.interval);
        let result = producer.run(&self.dataset, stream).await;

        match &result {
            Ok(report) => info!(
                sent = report.messages_sent,
                peer_closed = report.peer_closed,
                "Client connection closed: {}",
                peer
            ),
            Err(e) => error!("Error during data sending to {}: {}", peer, e),
        }

        result
    }
}
