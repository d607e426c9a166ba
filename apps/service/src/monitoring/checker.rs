use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::types::{Measurement, Outcome};

const USER_AGENT: &str = concat!("healthcheck/", env!("CARGO_PKG_VERSION"));

/// Checker trait for probing a single endpoint
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    /// Perform exactly one check.
    ///
    /// Returns `None` only when `cancel` fired before the check could finish;
    /// every other outcome, including network errors, yields a measurement.
    async fn check(&self, endpoint: &str, cancel: &CancellationToken) -> Option<Measurement>;
}

/// HTTP/HTTPS checker backed by one pooled client
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Checker for HttpChecker {
    async fn check(&self, endpoint: &str, cancel: &CancellationToken) -> Option<Measurement> {
        if cancel.is_cancelled() {
            return None;
        }

        let start = Instant::now();
        let send = self.client.get(endpoint).send();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            result = send => result,
        };
        let elapsed = start.elapsed();

        match result {
            Ok(response) => {
                let outcome = Outcome::from_status(response.status().as_u16());
                // Body is never read; dropping releases the pooled connection.
                drop(response);
                Some(Measurement::new(endpoint, elapsed, outcome))
            }
            // The token can fire between the request failing and us looking at it.
            Err(_) if cancel.is_cancelled() => None,
            Err(error) => {
                debug!(url = endpoint, error = %error, "HTTP request failed");
                Some(Measurement::transport_failure(endpoint, elapsed))
            }
        }
    }
}
