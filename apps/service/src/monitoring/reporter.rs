//! Periodic summary of every endpoint's statistics.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::metrics::{MetricsStore, StatsSnapshot};
use super::types::format_millis;

/// Emits one summary line per active endpoint on every tick
pub struct MetricsReporter {
    store: Arc<MetricsStore>,
    interval: Duration,
}

impl MetricsReporter {
    pub fn new(store: Arc<MetricsStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Report until `cancel` fires
    pub async fn run(&self, cancel: &CancellationToken) {
        assert!(!self.interval.is_zero(), "report interval must be positive");

        let mut timer = interval_at(Instant::now() + self.interval, self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(reason = "cancelled", "stopping health check metrics");
                    return;
                }
                _ = timer.tick() => {
                    self.report("metrics");
                }
            }
        }
    }

    /// Log the current snapshot of every endpoint that has been checked.
    ///
    /// Returns the number of lines emitted.
    pub fn report(&self, message: &'static str) -> usize {
        let mut reported = 0;
        for (endpoint, snapshot) in self.store.snapshots() {
            let Some(line) = ReportLine::from_snapshot(&snapshot) else {
                continue;
            };
            info!(
                url = endpoint,
                total_checks = line.total_checks,
                successful_checks = line.successful_checks,
                success_rate = %line.success_rate,
                avg_response_time = %line.avg_response_time,
                "{message}"
            );
            reported += 1;
        }
        reported
    }
}

/// Rendered fields of one summary line
#[derive(Debug, PartialEq, Eq)]
struct ReportLine {
    total_checks: u64,
    successful_checks: u64,
    success_rate: String,
    avg_response_time: String,
}

impl ReportLine {
    /// `None` for endpoints that have not been checked yet
    fn from_snapshot(snapshot: &StatsSnapshot) -> Option<Self> {
        let success_rate = snapshot.success_rate()?;
        let avg_response_time = snapshot
            .average_response_time()
            .map(format_millis)
            .unwrap_or_else(|| "NONE".to_string());

        Some(Self {
            total_checks: snapshot.total_checks,
            successful_checks: snapshot.successful_checks,
            success_rate: format!("{success_rate:.1}%"),
            avg_response_time,
        })
    }
}
