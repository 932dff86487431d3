use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Lock-free counters for one consumer session context
pub struct SessionMetrics {
    samples_received: AtomicU64,
    outcomes_recorded: AtomicU64,
    seizures_detected: AtomicU64,
    errors_count: AtomicU64,
    sessions_started: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            samples_received: AtomicU64::new(0),
            outcomes_recorded: AtomicU64::new(0),
            seizures_detected: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn samples_received(&self) -> u64 {
        self.samples_received.load(Ordering::Relaxed)
    }

    pub fn outcomes_recorded(&self) -> u64 {
        self.outcomes_recorded.load(Ordering::Relaxed)
    }

    pub fn seizures_detected(&self) -> u64 {
        self.seizures_detected.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    pub fn record_sample(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, seizure: bool) {
        self.outcomes_recorded.fetch_add(1, Ordering::Relaxed);
        if seizure {
            self.seizures_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_start(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_inference(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_inference(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
