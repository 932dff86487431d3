pub mod metrics;
pub mod monitor;

pub use metrics::SessionMetrics;
pub use monitor::{MetricsSnapshot, SessionMonitor};
