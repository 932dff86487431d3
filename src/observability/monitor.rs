use std::sync::Arc;

use super::SessionMetrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub outcomes_recorded: u64,
    pub seizures_detected: u64,
    pub errors_count: u64,
    pub sessions_started: u64,
    pub avg_latency_us: u64,
}

pub struct SessionMonitor {
    metrics: Arc<SessionMetrics>,
}

impl SessionMonitor {
    pub fn new(metrics: Arc<SessionMetrics>) -> Self {
        Self { metrics }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_received: self.metrics.samples_received(),
            outcomes_recorded: self.metrics.outcomes_recorded(),
            seizures_detected: self.metrics.seizures_detected(),
            errors_count: self.metrics.errors_count(),
            sessions_started: self.metrics.sessions_started(),
            avg_latency_us: self.metrics.avg_latency_us(),
        }
    }

    pub fn generate_report(&self) -> String {
        let s = self.snapshot();

        if s.sessions_started == 0 {
            return "No sessions started".to_string();
        }

        let mut report = String::from("=== Stream Metrics ===\n");
        report.push_str(&format!(
            "  Sessions: {}\n  Samples: {} received\n  Outcomes: {} recorded ({} seizure{})\n  Errors: {}\n  Avg Inference Latency: {}μs\n",
            s.sessions_started,
            s.samples_received,
            s.outcomes_recorded,
            s.seizures_detected,
            if s.seizures_detected == 1 { "" } else { "s" },
            s.errors_count,
            s.avg_latency_us
        ));

        report
    }
}
