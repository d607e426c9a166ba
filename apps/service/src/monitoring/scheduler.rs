use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::checker::Checker;
use super::metrics::{EndpointStats, MetricsStore};
use super::types::{Measurement, format_millis};

/// Monitoring scheduler - spawns one check loop per endpoint
pub struct MonitoringScheduler {
    checker: Arc<dyn Checker>,
    store: Arc<MetricsStore>,
    interval: Duration,
}

impl MonitoringScheduler {
    pub fn new(checker: Arc<dyn Checker>, store: Arc<MetricsStore>, interval: Duration) -> Self {
        Self { checker, store, interval }
    }

    /// Schedule a single endpoint for periodic checking
    pub fn schedule_monitor(&self, endpoint: String, cancel: CancellationToken) -> JoinHandle<()> {
        let checker = Arc::clone(&self.checker);
        // Resolve the record once; the loop never touches the map again.
        let stats = self.store.stats(&endpoint);
        let interval = self.interval;

        tokio::spawn(async move {
            run_check_loop(endpoint, checker.as_ref(), &stats, interval, &cancel).await;
        })
    }

    /// Schedule every endpoint in the store
    pub fn schedule_monitors(&self, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        self.store
            .endpoints()
            .iter()
            .map(|endpoint| self.schedule_monitor(endpoint.clone(), cancel.clone()))
            .collect()
    }
}

/// Drive one endpoint until `cancel` fires.
///
/// The first check happens one full `interval` after the loop starts.
pub async fn run_check_loop(
    endpoint: String,
    checker: &dyn Checker,
    stats: &EndpointStats,
    interval: Duration,
    cancel: &CancellationToken,
) {
    assert!(!interval.is_zero(), "check interval for {endpoint} must be positive");

    let mut timer = interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(url = %endpoint, reason = "cancelled", "stopping health check for URL");
                return;
            }
            _ = timer.tick() => {}
        }

        let Some(measurement) = checker.check(&endpoint, cancel).await else {
            // Only a shutdown suppresses a measurement; the select above returns next.
            continue;
        };

        stats.record(measurement.outcome, measurement.elapsed);
        log_measurement(&measurement);
    }
}

fn log_measurement(measurement: &Measurement) {
    let status = measurement.outcome.to_string();
    let healthy = measurement.outcome.is_healthy();
    let response_time = format_millis(measurement.elapsed);

    if healthy {
        info!(
            url = %measurement.endpoint,
            status = %status,
            healthy,
            response_time = %response_time,
            "check completed"
        );
    } else {
        error!(
            url = %measurement.endpoint,
            status = %status,
            healthy,
            response_time = %response_time,
            "check completed"
        );
    }
}
