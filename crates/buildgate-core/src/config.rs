//! Checker configuration.
//!
//! Loaded from a TOML file, or built from compiled-in defaults when no
//! path is supplied. The file carries the expected-error allow-list and
//! the per-phase watch timeout:
//!
//! ```toml
//! timeout_ms = 420000
//! expected_errors = [
//!     'ERROR #98124  WEBPACK',
//!     { literal = "Title underline too short" },
//! ]
//! ```
//!
//! Bare strings are regular-expression sources; `{ literal = "..." }`
//! entries match by substring containment.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::expected::ExpectedError;

/// Stock allow-list: the documentation toolchain's known noise. SDK apiref
/// warnings, one numbered webpack error, two deprecated directives and
/// title-underline-length complaints.
const DEFAULT_EXPECTED: [&str; 5] = [
    r#"(WARNING|ERROR)\(sdk/java/api.*"#,
    r#"ERROR #98124  WEBPACK"#,
    r#"WARNING.*: Directive "container" has been deprecated"#,
    r#"WARNING.*: Directive "cssclass" has been deprecated"#,
    r#"Title (overline|underline) too (short|long)"#,
];

/// Default per-phase watch timeout of 7 minutes.
const DEFAULT_TIMEOUT_MS: u64 = 7 * 60 * 1000;

/// Errors raised while loading or validating the checker configuration.
///
/// All of these are fatal. A check never starts with a configuration that
/// did not validate.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or a field has the wrong type.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A required field is absent.
    #[error("config file {path} is missing required field '{field}'")]
    MissingField { path: String, field: &'static str },

    /// `timeout_ms` must be greater than zero.
    #[error("config file {path}: timeout_ms must be greater than zero")]
    InvalidTimeout { path: String },

    /// An expected-error entry is not a valid regular expression.
    #[error("config file {path}: invalid expected-error pattern '{pattern}': {source}")]
    BadPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// On-disk shape before validation.
#[derive(Debug, Deserialize)]
struct RawConfig {
    expected_errors: Option<Vec<RawEntry>>,
    timeout_ms: Option<u64>,
}

/// A bare string is a regex source; an inline table selects a literal.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Pattern(String),
    Literal { literal: String },
}

/// Validated checker configuration.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Allow-list applied to flagged log lines.
    pub expected_errors: Vec<ExpectedError>,
    /// How long each watch phase waits before falling back.
    pub timeout: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        let expected_errors = DEFAULT_EXPECTED
            .iter()
            .map(|source| ExpectedError::pattern(source).expect("stock pattern compiles"))
            .collect();
        CheckConfig {
            expected_errors,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl CheckConfig {
    /// Load from `path`, or fall back to the stock configuration when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Read and validate a TOML config file.
    ///
    /// Fails on the first violation; the returned error names the file and
    /// the offending field or entry.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: shown.clone(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: shown.clone(),
            source,
        })?;

        let entries = raw.expected_errors.ok_or_else(|| ConfigError::MissingField {
            path: shown.clone(),
            field: "expected_errors",
        })?;
        let timeout_ms = raw.timeout_ms.ok_or_else(|| ConfigError::MissingField {
            path: shown.clone(),
            field: "timeout_ms",
        })?;
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout { path: shown });
        }

        let mut expected_errors = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                RawEntry::Pattern(source) => {
                    let compiled = ExpectedError::pattern(&source).map_err(|err| {
                        ConfigError::BadPattern {
                            path: shown.clone(),
                            pattern: source.clone(),
                            source: err,
                        }
                    })?;
                    expected_errors.push(compiled);
                }
                RawEntry::Literal { literal } => {
                    expected_errors.push(ExpectedError::literal(literal));
                }
            }
        }

        debug!(
            path = %shown,
            entries = expected_errors.len(),
            timeout_ms,
            "loaded checker config"
        );
        Ok(CheckConfig {
            expected_errors,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}
