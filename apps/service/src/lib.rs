//! Concurrent HTTP health checker.
//!
//! Every configured endpoint gets its own check loop; results are folded into
//! a per-endpoint statistics record and summarized by a periodic reporter.
//! All loops share a single cancellation token and are drained before
//! [`orchestrator::Engine::run`] returns.

pub mod config;
pub mod monitoring;
pub mod orchestrator;
pub mod validation;

pub use config::{Config, ConfigError};
pub use orchestrator::{Engine, EngineError, EngineSettings};
