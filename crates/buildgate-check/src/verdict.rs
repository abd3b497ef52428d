//! Verdict assembly for a resolved build.

use buildgate_core::{classify_log, CheckConfig, LogClassification};
use buildgate_state::{BuildRecord, BuildStatus};
use serde::Serialize;

/// Final verdict for one build check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckVerdict {
    /// Every warning/error line pulled from the build, in log order.
    pub flagged: Vec<String>,

    /// Entries the allow-list does not cover (empty if passed).
    pub unexpected: Vec<String>,

    /// Summary message.
    pub message: String,
}

impl CheckVerdict {
    /// The exit-code side of the contract: true maps to exit 0.
    pub fn passed(&self) -> bool {
        self.unexpected.is_empty()
    }

    /// Build a verdict from classified log lines.
    pub fn from_classification(classification: LogClassification) -> Self {
        let message = summary(&classification.flagged, &classification.unexpected);
        CheckVerdict {
            flagged: classification.flagged,
            unexpected: classification.unexpected,
            message,
        }
    }

    /// A verdict whose single entry bypasses the allow-list.
    ///
    /// Used for the degenerate outcomes: a failed build, nothing found,
    /// a malformed target, a record without usable logs. The entry is
    /// surfaced verbatim, so no allow-list pattern can accidentally
    /// whitelist it.
    pub fn from_failure(entry: impl Into<String>) -> Self {
        let entry = entry.into();
        CheckVerdict {
            flagged: vec![entry.clone()],
            unexpected: vec![entry],
            message: "Encountered the following unexpected errors:".to_string(),
        }
    }
}

fn summary(flagged: &[String], unexpected: &[String]) -> String {
    if !unexpected.is_empty() {
        "Encountered the following unexpected errors:".to_string()
    } else if flagged.is_empty() {
        "Build completed without errors.".to_string()
    } else {
        "Passed with expected errors.".to_string()
    }
}

/// Classify a resolved build into a verdict.
///
/// - `failed` status: the worker's own failure record is the single
///   unexpected entry; the logs are not parsed.
/// - absent or empty logs: a malformed record produces a diagnostic entry
///   instead of a crash.
/// - otherwise the joined log text goes through the classifier.
pub fn evaluate_build(build: &BuildRecord, config: &CheckConfig) -> CheckVerdict {
    if build.status == BuildStatus::Failed {
        let (time, reason) = match &build.error {
            Some(failure) => (failure.time.as_str(), failure.reason.as_str()),
            // A failed build should always carry failure details; cover
            // the malformed case anyway.
            None => ("an unknown time", "no reason recorded"),
        };
        return CheckVerdict::from_failure(format!("Build failed at {time}\n\n{reason}"));
    }

    let logs = match &build.logs {
        None => {
            return CheckVerdict::from_failure(format!(
                "Build {} has no logs. The build worker may have written a malformed record.",
                build.build_id
            ))
        }
        Some(logs) if logs.is_empty() => {
            return CheckVerdict::from_failure(format!(
                "Build {} has empty logs. The build worker may have written a malformed record.",
                build.build_id
            ))
        }
        Some(logs) => logs,
    };

    CheckVerdict::from_classification(classify_log(&logs.join("\n"), &config.expected_errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgate_state::{BuildFailure, BuildPayload};

    fn payload() -> BuildPayload {
        BuildPayload {
            repo_owner: "mongodb".to_string(),
            repo_name: "docs-java".to_string(),
            branch_name: "master".to_string(),
        }
    }

    fn completed(logs: &[&str]) -> BuildRecord {
        BuildRecord::new(payload()).completed(logs.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn clean_build_passes_without_errors() {
        let build = completed(&["INFO start", "INFO done"]);
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(verdict.passed());
        assert!(verdict.flagged.is_empty());
        assert_eq!(verdict.message, "Build completed without errors.");
    }

    #[test]
    fn expected_noise_passes_with_expected_errors() {
        let build = completed(&[
            "INFO start",
            "WARNING: Directive \"container\" has been deprecated",
            "ERROR #98124  WEBPACK",
        ]);
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(verdict.passed());
        assert_eq!(verdict.flagged.len(), 2);
        assert!(verdict.unexpected.is_empty());
        assert_eq!(verdict.message, "Passed with expected errors.");
    }

    #[test]
    fn unexpected_error_fails_the_verdict() {
        let build = completed(&["ERROR: disk full"]);
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(!verdict.passed());
        assert_eq!(verdict.unexpected, vec!["ERROR: disk full".to_string()]);
        assert_eq!(
            verdict.message,
            "Encountered the following unexpected errors:"
        );
    }

    #[test]
    fn failed_build_surfaces_time_and_reason_verbatim() {
        let mut build = BuildRecord::new(payload()).failed("R");
        build.error = Some(BuildFailure {
            time: "T".to_string(),
            reason: "R".to_string(),
        });
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert_eq!(verdict.unexpected, vec!["Build failed at T\n\nR".to_string()]);
        assert!(!verdict.passed());
    }

    #[test]
    fn failed_build_skips_log_parsing() {
        let mut build = BuildRecord::new(payload()).failed("boom");
        // Even pre-approved noise in the logs must not dilute the failure.
        build.logs = Some(vec!["ERROR #98124  WEBPACK".to_string()]);
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert_eq!(verdict.unexpected.len(), 1);
        assert!(verdict.unexpected[0].starts_with("Build failed at "));
    }

    #[test]
    fn failed_build_without_details_still_reports() {
        let mut build = BuildRecord::new(payload()).failed("placeholder");
        build.error = None;
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(!verdict.passed());
        assert!(verdict.unexpected[0].contains("no reason recorded"));
    }

    #[test]
    fn missing_logs_produce_a_diagnostic() {
        let mut build = completed(&["INFO ok"]);
        build.logs = None;
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(!verdict.passed());
        assert!(verdict.unexpected[0].contains("has no logs"));
        assert!(verdict.unexpected[0].contains(&build.build_id));
    }

    #[test]
    fn empty_logs_produce_a_diagnostic() {
        let build = completed(&[]);
        let verdict = evaluate_build(&build, &CheckConfig::default());
        assert!(!verdict.passed());
        assert!(verdict.unexpected[0].contains("has empty logs"));
    }

    #[test]
    fn degenerate_entry_is_both_flagged_and_unexpected() {
        let verdict = CheckVerdict::from_failure("something explanatory");
        assert_eq!(verdict.flagged, verdict.unexpected);
        assert!(!verdict.passed());
    }
}
