/// Monitoring engine module - probes endpoints and keeps their statistics
///
/// This module is responsible for:
/// - Executing HTTP/HTTPS checks
/// - Scheduling one check loop per endpoint
/// - Holding per-endpoint statistics
/// - Periodically reporting those statistics
pub mod checker;
pub mod metrics;
pub mod reporter;
pub mod scheduler;
pub mod types;

pub use checker::{Checker, HttpChecker};
pub use metrics::{EndpointStats, MetricsStore, StatsSnapshot};
pub use reporter::MetricsReporter;
pub use scheduler::MonitoringScheduler;
pub use types::{Measurement, Outcome};
