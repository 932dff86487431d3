use anyhow::Result;
use async_trait::async_trait;
use seizure_watch::config::StreamConfig;
use seizure_watch::controller::{FetchController, StartOutcome, StopOutcome};
use seizure_watch::core::FeatureVector;
use seizure_watch::inference::ModelService;
use seizure_watch::session::{SessionEvent, SessionPhase};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::time::{sleep, Instant};

struct FixedModel(i64);

#[async_trait]
impl ModelService for FixedModel {
    async fn predict(&self, _features: &FeatureVector) -> Result<i64> {
        Ok(self.0)
    }
}

/// Accepts every connection and streams samples on it until the peer goes
/// away. Connections listed in `malformed_on` receive garbage first.
async fn spawn_feed(
    interval: Duration,
    malformed_on: Vec<usize>,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let index = counter.fetch_add(1, Ordering::SeqCst);
            let malformed = malformed_on.contains(&index);

            tokio::spawn(async move {
                if malformed && stream.write_all(b"not a sample\n").await.is_err() {
                    return;
                }
                let mut value = 0.0;
                loop {
                    let line = format!("{{\"C3-P3\": {}}}\n", value);
                    if stream.write_all(line.as_bytes()).await.is_err() {
                        return;
                    }
                    value += 1.0;
                    sleep(interval).await;
                }
            });
        }
    });

    (address, accepted)
}

fn config(address: SocketAddr) -> StreamConfig {
    let mut config = StreamConfig::default();
    config.endpoint.host = address.ip().to_string();
    config.endpoint.port = address.port();
    config.consumer.connect_timeout_ms = 1_000;
    config.consumer.poll_interval_ms = 20;
    config.consumer.idle_timeout_ms = 5_000;
    config
}

fn controller(config: &StreamConfig) -> FetchController {
    FetchController::new(config, Arc::new(FixedModel(1)), Handle::current())
}

async fn wait_until<F>(mut condition: F, limit: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_is_idempotent() {
    let (address, accepted) = spawn_feed(Duration::from_millis(20), vec![]).await;
    let controller = controller(&config(address));

    assert_eq!(controller.start(), StartOutcome::Started);
    assert_eq!(controller.start(), StartOutcome::AlreadyRunning);

    let context = controller.context();
    assert!(wait_until(|| context.ledger.len() >= 2, Duration::from_secs(2)).await);
    assert_eq!(controller.start(), StartOutcome::AlreadyRunning);
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    assert_eq!(controller.shutdown().await, Some(SessionPhase::Closed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_then_restart() {
    let interval = Duration::from_millis(50);
    let (address, accepted) = spawn_feed(interval, vec![]).await;
    let controller = controller(&config(address));
    let context = controller.context();

    controller.start();
    assert!(wait_until(|| context.ledger.len() >= 2, Duration::from_secs(2)).await);

    assert_eq!(controller.stop(), StopOutcome::Stopping);
    // Stop is observed within one producer interval plus one poll slice
    assert!(wait_until(|| !controller.is_running(), interval + Duration::from_millis(200)).await);
    assert_eq!(controller.phase(), SessionPhase::Closed);
    assert!(!context.state.is_fetching());

    let recorded = context.ledger.len();
    sleep(interval * 3).await;
    assert_eq!(context.ledger.len(), recorded);

    assert_eq!(controller.start(), StartOutcome::Started);
    assert!(wait_until(|| context.ledger.len() > recorded, Duration::from_secs(2)).await);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);

    // Positions keep growing across sessions
    let positions: Vec<u64> = context
        .ledger
        .snapshot()
        .iter()
        .map(|o| o.sequence_position)
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_session_needs_explicit_restart() {
    let (address, accepted) = spawn_feed(Duration::from_millis(20), vec![0]).await;
    let controller = controller(&config(address));
    let context = controller.context();

    controller.start();
    assert!(wait_until(|| !controller.is_running(), Duration::from_secs(2)).await);
    assert!(matches!(controller.phase(), SessionPhase::Failed { .. }));
    assert!(context.ledger.is_empty());

    // No reconnect on its own
    sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);

    assert_eq!(controller.start(), StartOutcome::Started);
    assert!(wait_until(|| !context.ledger.is_empty(), Duration::from_secs(2)).await);
    assert_eq!(controller.phase(), SessionPhase::Streaming);

    controller.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_without_session() {
    let (address, _accepted) = spawn_feed(Duration::from_millis(20), vec![]).await;
    let controller = controller(&config(address));

    assert_eq!(controller.stop(), StopOutcome::NotRunning);
    assert!(!controller.is_running());
    assert_eq!(controller.join().await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_producer_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let controller = controller(&config(address));
    assert_eq!(controller.start(), StartOutcome::Started);

    match controller.join().await {
        Some(SessionPhase::Failed { error_msg }) => assert!(error_msg.contains("Transport")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(!controller.context().state.is_fetching());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_events_reach_presenter() {
    let (address, _accepted) = spawn_feed(Duration::from_millis(20), vec![]).await;
    let controller = controller(&config(address));
    let events = controller.events();

    controller.start();
    let context = controller.context();
    assert!(wait_until(|| !context.ledger.is_empty(), Duration::from_secs(2)).await);
    controller.shutdown().await;

    let received: Vec<SessionEvent> = events.try_iter().collect();
    assert!(received
        .iter()
        .any(|e| matches!(e, SessionEvent::PhaseChanged(SessionPhase::Streaming))));
    assert!(received.iter().any(|e| matches!(e, SessionEvent::Outcome(_))));
    assert!(matches!(
        received.last(),
        Some(SessionEvent::PhaseChanged(SessionPhase::Closed))
    ));
}
