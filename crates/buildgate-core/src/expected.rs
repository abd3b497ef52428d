//! The expected-error allow-list.

use std::fmt;

use regex::Regex;

/// One allow-list entry for flagged log lines.
///
/// `Pattern` entries match anywhere within the line (search semantics, not
/// a full-line match). `Literal` entries match by substring containment.
#[derive(Debug, Clone)]
pub enum ExpectedError {
    Literal(String),
    Pattern(Regex),
}

impl ExpectedError {
    /// Compile a regular-expression source into a `Pattern` entry.
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(ExpectedError::Pattern(Regex::new(source)?))
    }

    /// Wrap a plain substring as a `Literal` entry.
    pub fn literal(text: impl Into<String>) -> Self {
        ExpectedError::Literal(text.into())
    }

    /// Whether this entry covers the given log line.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            ExpectedError::Literal(text) => line.contains(text.as_str()),
            ExpectedError::Pattern(regex) => regex.is_match(line),
        }
    }
}

impl fmt::Display for ExpectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedError::Literal(text) => write!(f, "{text}"),
            ExpectedError::Pattern(regex) => write!(f, "{}", regex.as_str()),
        }
    }
}
