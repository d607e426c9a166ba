/// Orchestrator module - owns the metrics store and drives every loop
///
/// The engine:
/// - Builds one statistics record per endpoint before anything runs
/// - Spawns the reporter and one check loop per endpoint
/// - Waits for all of them after cancellation, so nothing outlives `run`

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::monitoring::{Checker, HttpChecker, MetricsReporter, MetricsStore, MonitoringScheduler};

/// Validated inputs for [`Engine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub endpoints: Vec<String>,
    pub check_interval: Duration,
    pub report_interval: Duration,
    pub timeout: Duration,
    /// Safety ceiling on the number of endpoints
    pub max_endpoints: usize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no endpoints configured")]
    NoEndpoints,
    #[error("{count} endpoints configured, the limit is {max}")]
    TooManyEndpoints { count: usize, max: usize },
    #[error("{0} must be positive")]
    ZeroDuration(&'static str),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl EngineSettings {
    fn check(&self) -> Result<(), EngineError> {
        if self.endpoints.is_empty() {
            return Err(EngineError::NoEndpoints);
        }
        if self.endpoints.len() > self.max_endpoints {
            return Err(EngineError::TooManyEndpoints {
                count: self.endpoints.len(),
                max: self.max_endpoints,
            });
        }
        if self.check_interval.is_zero() {
            return Err(EngineError::ZeroDuration("check interval"));
        }
        if self.report_interval.is_zero() {
            return Err(EngineError::ZeroDuration("report interval"));
        }
        if self.timeout.is_zero() {
            return Err(EngineError::ZeroDuration("timeout"));
        }
        Ok(())
    }
}

/// Main engine for the health checker
pub struct Engine {
    checker: Arc<dyn Checker>,
    store: Arc<MetricsStore>,
    check_interval: Duration,
    report_interval: Duration,
}

impl Engine {
    /// Create an engine probing over HTTP
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        settings.check()?;
        let checker = HttpChecker::new(settings.timeout)?;
        Ok(Self::build(settings, Arc::new(checker)))
    }

    /// Create an engine around any [`Checker`]
    pub fn with_checker(
        settings: EngineSettings,
        checker: Arc<dyn Checker>,
    ) -> Result<Self, EngineError> {
        settings.check()?;
        Ok(Self::build(settings, checker))
    }

    /// `settings` must already have passed `EngineSettings::check`
    fn build(settings: EngineSettings, checker: Arc<dyn Checker>) -> Self {
        let store = Arc::new(MetricsStore::new(settings.endpoints));
        info!(endpoints = store.endpoints().len(), "Initialized metrics for all endpoints");

        Self {
            checker,
            store,
            check_interval: settings.check_interval,
            report_interval: settings.report_interval,
        }
    }

    pub fn store(&self) -> Arc<MetricsStore> {
        Arc::clone(&self.store)
    }

    /// Run every loop until `cancel` fires, then wait for all of them.
    ///
    /// A loop that panics cancels the rest; the panic is re-raised once
    /// everything has drained.
    pub async fn run(&self, cancel: &CancellationToken) {
        let cancel = cancel.child_token();
        info!(
            endpoints = self.store.endpoints().len(),
            check_interval_ms = millis(self.check_interval),
            report_interval_ms = millis(self.report_interval),
            "Starting health checks"
        );

        let mut tasks = FuturesUnordered::new();

        let reporter = MetricsReporter::new(self.store(), self.report_interval);
        let reporter_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move { reporter.run(&reporter_cancel).await }));

        let scheduler =
            MonitoringScheduler::new(Arc::clone(&self.checker), self.store(), self.check_interval);
        tasks.extend(scheduler.schedule_monitors(&cancel));

        let mut panic_payload = None;
        while let Some(joined) = tasks.next().await {
            let Err(join_error) = joined else {
                continue;
            };
            error!(error = %join_error, "Health check task ended abnormally");
            cancel.cancel();
            if join_error.is_panic() && panic_payload.is_none() {
                panic_payload = Some(join_error.into_panic());
            }
        }

        info!("All healthchecks stopped");

        if let Some(payload) = panic_payload {
            std::panic::resume_unwind(payload);
        }
    }

    /// Log one last summary line per checked endpoint
    pub fn report_final(&self) -> usize {
        MetricsReporter::new(self.store(), self.report_interval).report("final metrics")
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
