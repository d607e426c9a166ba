use std::time::Duration;
use std::{env, fmt, fs, io, path};

use serde::Deserialize;
use thiserror::Error;

use crate::orchestrator::EngineSettings;
use crate::validation::{validate_interval, validate_timeout, validate_urls};

/// Environment variable consulted when no `--config` flag is given
pub const CONFIG_ENV: &str = "HEALTHCHECK_CONFIG";

/// Candidates tried in the working directory, in order
const DEFAULT_CONFIG_FILES: [&str; 2] = ["config.toml", "config.json"];

/// Safety ceiling on the number of monitored endpoints
pub const DEFAULT_MAX_ENDPOINTS: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found (tried {})", DEFAULT_CONFIG_FILES.join(", "))]
    NotFound,
    #[error("failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: path::PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {message}", .path.display())]
    ParseFailed { path: path::PathBuf, message: String },
    #[error("check_interval_seconds: {0}")]
    InvalidInterval(String),
    #[error("report_interval_seconds: {0}")]
    InvalidReportInterval(String),
    #[error("timeout_seconds: {0}")]
    InvalidTimeout(String),
    #[error("no URLs provided")]
    NoUrls,
    #[error("no valid URLs provided")]
    NoValidUrls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &path::Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

fn default_max_endpoints() -> usize {
    DEFAULT_MAX_ENDPOINTS
}

/// On-disk configuration, before validation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub check_interval_seconds: i64,
    pub timeout_seconds: i64,
    #[serde(alias = "Urls")]
    pub urls: Vec<String>,
    /// Defaults to the check interval
    #[serde(default)]
    pub report_interval_seconds: Option<i64>,
    #[serde(default = "default_max_endpoints")]
    pub max_endpoints: usize,
}

/// Pick the configuration file: explicit path, then `$HEALTHCHECK_CONFIG`,
/// then the first default file present in the working directory.
fn resolve_config_path(explicit: Option<&path::Path>) -> Result<path::PathBuf, ConfigError> {
    resolve_config_path_in(explicit, env::var(CONFIG_ENV).ok(), path::Path::new("."))
}

/// A blank `env_value` counts as unset; defaults are looked up under `dir`.
fn resolve_config_path_in(
    explicit: Option<&path::Path>,
    env_value: Option<String>,
    dir: &path::Path,
) -> Result<path::PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Some(path) = env_value
        && !path.trim().is_empty()
    {
        return Ok(path::PathBuf::from(path));
    }

    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.exists())
        .ok_or(ConfigError::NotFound)
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);
        let write_2 = write_indented(2);

        writeln!(f, "Current Health Checker Configuration:")?;
        write_title_1(f, "Schedule")?;
        write_1(f, "Check Interval (s)", &self.check_interval_seconds)?;
        match self.report_interval_seconds {
            Some(seconds) => write_1(f, "Report Interval (s)", &seconds)?,
            None => write_1(f, "Report Interval (s)", &"same as check interval")?,
        }
        write_1(f, "Timeout (s)", &self.timeout_seconds)?;
        write_1(f, "Max Endpoints", &self.max_endpoints)?;
        write_title_1(f, "Endpoints")?;
        for url in &self.urls {
            write_2(f, "URL", url)?;
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// `.json` files are parsed as JSON, anything else as TOML.
    ///
    /// ```rust,ignore
    /// let cfg = config::Config::from_config(None)?;
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<&path::Path>) -> Result<Self, ConfigError> {
        let config_path = resolve_config_path(optional_path)?;

        let raw_string = fs::read_to_string(&config_path)
            .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;

        Self::parse(&raw_string, Format::of(&config_path))
            .map_err(|message| ConfigError::ParseFailed { path: config_path, message })
    }

    fn parse(raw: &str, format: Format) -> Result<Self, String> {
        match format {
            Format::Toml => toml::from_str(raw).map_err(|err| err.to_string()),
            Format::Json => serde_json::from_str(raw).map_err(|err| err.to_string()),
        }
    }

    /// Check every field and turn the file contents into engine settings
    pub fn validate(&self) -> Result<EngineSettings, ConfigError> {
        validate_interval(self.check_interval_seconds)
            .into_result()
            .map_err(ConfigError::InvalidInterval)?;

        let report_interval_seconds =
            self.report_interval_seconds.unwrap_or(self.check_interval_seconds);
        validate_interval(report_interval_seconds)
            .into_result()
            .map_err(ConfigError::InvalidReportInterval)?;

        validate_timeout(self.timeout_seconds, self.check_interval_seconds)
            .into_result()
            .map_err(ConfigError::InvalidTimeout)?;

        if self.urls.is_empty() {
            return Err(ConfigError::NoUrls);
        }
        let endpoints = validate_urls(&self.urls);
        if endpoints.is_empty() {
            return Err(ConfigError::NoValidUrls);
        }

        Ok(EngineSettings {
            endpoints,
            check_interval: seconds(self.check_interval_seconds),
            report_interval: seconds(report_interval_seconds),
            timeout: seconds(self.timeout_seconds),
            max_endpoints: self.max_endpoints,
        })
    }
}

/// Only called on values `validate_interval`/`validate_timeout` accepted
fn seconds(value: i64) -> Duration {
    Duration::from_secs(value.unsigned_abs())
}
