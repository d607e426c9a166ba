use std::time::Duration;

/// Classification of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No response was obtained (DNS, connect, timeout, ...)
    TransportFailure,
    /// A response arrived with a status outside 2xx
    Unhealthy { status: u16 },
    /// A response arrived with a 2xx status
    Healthy { status: u16 },
}

impl Outcome {
    /// Classify a received HTTP status code
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            Outcome::Healthy { status }
        } else {
            Outcome::Unhealthy { status }
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Outcome::Healthy { .. })
    }

    /// Whether the check got an HTTP response at all
    pub fn responded(&self) -> bool {
        !matches!(self, Outcome::TransportFailure)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Outcome::TransportFailure => None,
            Outcome::Unhealthy { status } | Outcome::Healthy { status } => Some(*status),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code() {
            Some(status) => write!(f, "{status}"),
            None => write!(f, "NONE"),
        }
    }
}

/// Result of one check, folded into the statistics record and then dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Endpoint that was checked
    pub endpoint: String,

    /// Time from dispatch until the status was known (or the failure surfaced)
    pub elapsed: Duration,

    pub outcome: Outcome,
}

impl Measurement {
    pub fn new(endpoint: impl Into<String>, elapsed: Duration, outcome: Outcome) -> Self {
        Self { endpoint: endpoint.into(), elapsed, outcome }
    }

    pub fn healthy(endpoint: impl Into<String>, elapsed: Duration, status: u16) -> Self {
        Self::new(endpoint, elapsed, Outcome::Healthy { status })
    }

    pub fn unhealthy(endpoint: impl Into<String>, elapsed: Duration, status: u16) -> Self {
        Self::new(endpoint, elapsed, Outcome::Unhealthy { status })
    }

    pub fn transport_failure(endpoint: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(endpoint, elapsed, Outcome::TransportFailure)
    }
}

/// Format a duration the way every log line reports latency
pub fn format_millis(duration: Duration) -> String {
    format!("{}ms", duration.as_millis())
}
