//! Per-endpoint running statistics.
//!
//! The key set is fixed when the store is built. Each record carries its own
//! guard, so writers to different endpoints never contend and the map itself
//! needs no lock.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use super::types::{Measurement, Outcome};

#[derive(Debug, Default)]
struct Counters {
    total_checks: u64,
    successful_checks: u64,
    responded_checks: u64,
    total_response_time: Duration,
}

/// Statistics record for one endpoint
///
/// Shared through `Arc` only, never cloned.
#[derive(Debug, Default)]
pub struct EndpointStats {
    counters: RwLock<Counters>,
}

/// Point-in-time copy of an [`EndpointStats`] record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total_checks: u64,
    pub successful_checks: u64,
    /// Checks that obtained an HTTP response; the averaging denominator
    pub responded_checks: u64,
    pub total_response_time: Duration,
}

impl StatsSnapshot {
    /// Mean latency over the checks that contributed latency
    pub fn average_response_time(&self) -> Option<Duration> {
        if self.responded_checks == 0 {
            return None;
        }
        let millis = self.total_response_time.as_millis() / u128::from(self.responded_checks);
        Some(Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX)))
    }

    /// Percentage of healthy checks, `None` before the first check
    pub fn success_rate(&self) -> Option<f64> {
        if self.total_checks == 0 {
            return None;
        }
        Some(self.successful_checks as f64 * 100.0 / self.total_checks as f64)
    }
}

impl EndpointStats {
    /// Fold one measurement into the record
    pub fn record(&self, outcome: Outcome, elapsed: Duration) {
        // Nothing below can panic, so a poisoned guard still holds consistent counters.
        let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
        counters.total_checks += 1;
        if outcome.responded() {
            counters.responded_checks += 1;
            counters.total_response_time += elapsed;
        }
        if outcome.is_healthy() {
            counters.successful_checks += 1;
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        StatsSnapshot {
            total_checks: counters.total_checks,
            successful_checks: counters.successful_checks,
            responded_checks: counters.responded_checks,
            total_response_time: counters.total_response_time,
        }
    }
}

/// Mapping from endpoint identity to its statistics record
#[derive(Debug)]
pub struct MetricsStore {
    order: Vec<String>,
    records: HashMap<String, Arc<EndpointStats>>,
}

impl MetricsStore {
    /// Build one record per endpoint, keeping configuration order
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order = Vec::new();
        let mut records = HashMap::new();

        for endpoint in endpoints {
            let endpoint = endpoint.into();
            if records.contains_key(&endpoint) {
                continue;
            }
            records.insert(endpoint.clone(), Arc::new(EndpointStats::default()));
            order.push(endpoint);
        }

        Self { order, records }
    }

    /// Endpoints in the order they were configured
    pub fn endpoints(&self) -> &[String] {
        &self.order
    }

    /// Shared handle to an endpoint's record
    ///
    /// # Panics
    ///
    /// Panics if `endpoint` was not part of the store at construction.
    pub fn stats(&self, endpoint: &str) -> Arc<EndpointStats> {
        Arc::clone(self.lookup(endpoint))
    }

    pub fn record(&self, measurement: &Measurement) {
        self.lookup(&measurement.endpoint).record(measurement.outcome, measurement.elapsed);
    }

    pub fn snapshot(&self, endpoint: &str) -> StatsSnapshot {
        self.lookup(endpoint).snapshot()
    }

    /// Snapshot every record, in configuration order
    pub fn snapshots(&self) -> Vec<(&str, StatsSnapshot)> {
        self.order
            .iter()
            .map(|endpoint| (endpoint.as_str(), self.lookup(endpoint).snapshot()))
            .collect()
    }

    fn lookup(&self, endpoint: &str) -> &Arc<EndpointStats> {
        match self.records.get(endpoint) {
            Some(stats) => stats,
            None => panic!("no statistics record for endpoint {endpoint:?}"),
        }
    }
}
