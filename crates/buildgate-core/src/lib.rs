//! Core domain library for buildgate.
//!
//! Re-exports the build target tuple, the expected-error allow-list, log
//! classification, and the checker configuration.

pub mod classify;
pub mod config;
pub mod expected;
pub mod target;
pub mod telemetry;

pub use classify::{classify_log, LogClassification};
pub use config::{CheckConfig, ConfigError};
pub use expected::ExpectedError;
pub use target::{BuildTarget, TargetError};
pub use telemetry::init_tracing;

/// Buildgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
