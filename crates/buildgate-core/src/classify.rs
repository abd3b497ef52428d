//! Warning/error extraction and classification.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::expected::ExpectedError;

/// A candidate line starts with the exact token `WARNING` or `ERROR`,
/// case-sensitive, anchored at the start of the line.
static FLAGGED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(WARNING|ERROR)").expect("line shape compiles"));

/// The warning/error lines of one build log, split by whether the
/// allow-list covers them.
///
/// Both sequences preserve log order, and `unexpected` is always a subset
/// of `flagged`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogClassification {
    /// Every line starting with `WARNING` or `ERROR`, in log order.
    pub flagged: Vec<String>,
    /// Flagged lines no expected-error entry covers.
    pub unexpected: Vec<String>,
}

impl LogClassification {
    /// True when no flagged line escaped the allow-list.
    pub fn is_clean(&self) -> bool {
        self.unexpected.is_empty()
    }
}

fn is_flagged(line: &str) -> bool {
    FLAGGED_LINE.is_match(line)
}

/// Classify a build log against the allow-list.
///
/// Lines that are not flagged are informational output and appear in
/// neither sequence. A flagged line is expected when at least one entry
/// matches it; entries are checked in order and the scan stops at the
/// first match, so entry order never changes the outcome.
pub fn classify_log(log: &str, expected: &[ExpectedError]) -> LogClassification {
    let mut classification = LogClassification::default();

    for line in log.lines() {
        if !is_flagged(line) {
            continue;
        }
        classification.flagged.push(line.to_string());
        if !expected.iter().any(|entry| entry.matches(line)) {
            classification.unexpected.push(line.to_string());
        }
    }

    classification
}
