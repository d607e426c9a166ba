use std::collections::HashSet;

use tracing::warn;
use url::Url;

/// Longest accepted check or report interval (24 hours)
const MAX_INTERVAL_SECONDS: i64 = 86_400;

/// Longest accepted request timeout (5 minutes)
const MAX_TIMEOUT_SECONDS: i64 = 300;

/// Validation results with specific error messages
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self { is_valid: true, error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(msg.into()) }
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.error.unwrap_or_else(|| "Validation failed".to_string()))
        }
    }
}

/// Validate HTTP/HTTPS URL endpoint
pub fn validate_http_endpoint(target: &str) -> ValidationResult {
    match parse_http_endpoint(target) {
        Ok(_) => ValidationResult::ok(),
        Err(msg) => ValidationResult::err(msg),
    }
}

fn parse_http_endpoint(target: &str) -> Result<Url, String> {
    if target.trim().is_empty() {
        return Err("Target cannot be empty".to_string());
    }

    let url = Url::parse(target.trim()).map_err(|e| {
        // If it fails to parse, check if it's missing a scheme
        if target.contains("://") {
            format!("Invalid URL: {e}")
        } else {
            "URL must include scheme (http:// or https://)".to_string()
        }
    })?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!("Invalid scheme '{scheme}'. Must be http or https"));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL must have a valid host".to_string());
    }

    Ok(url)
}

/// Validate and normalize the configured endpoint list.
///
/// Invalid entries are logged and dropped, duplicates (after normalization)
/// are dropped, and configuration order is preserved.
pub fn validate_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut valid = Vec::with_capacity(urls.len());

    for raw in urls {
        match parse_http_endpoint(raw) {
            Ok(url) => {
                let normalized = url.to_string();
                if seen.insert(normalized.clone()) {
                    valid.push(normalized);
                } else {
                    warn!(url = %raw, "Duplicate URL ignored");
                }
            }
            Err(error) => warn!(url = %raw, %error, "Invalid URL ignored"),
        }
    }

    valid
}

/// Validate check or report interval
pub fn validate_interval(interval: i64) -> ValidationResult {
    if interval <= 0 {
        return ValidationResult::err("Interval must be at least 1 second");
    }

    if interval > MAX_INTERVAL_SECONDS {
        return ValidationResult::err("Interval too long (max 24 hours)");
    }

    ValidationResult::ok()
}

/// Validate request timeout
///
/// A timeout at or above the interval is allowed: checks of one endpoint are
/// sequential, so a slow probe only delays that endpoint's next tick.
pub fn validate_timeout(timeout: i64, interval: i64) -> ValidationResult {
    if timeout <= 0 {
        return ValidationResult::err("Timeout must be at least 1 second");
    }

    if timeout > MAX_TIMEOUT_SECONDS {
        return ValidationResult::err("Timeout too long (max 5 minutes)");
    }

    if timeout >= interval {
        warn!(timeout, interval, "Timeout is not shorter than the check interval");
    }

    ValidationResult::ok()
}
