//! One complete build check: parse, locate, evaluate.

use buildgate_core::{BuildTarget, CheckConfig};
use buildgate_state::BuildQueue;
use tracing::{debug, info};

use crate::locate::{locate_build, LocatedBuild};
use crate::verdict::{evaluate_build, CheckVerdict};

/// Build check orchestrator.
pub struct BuildCheck;

impl BuildCheck {
    /// Run one check for the raw CLI tuple against the queue.
    ///
    /// Only infrastructure failures surface as errors. Every build-side
    /// failure mode (malformed tuple, nothing found, failed build,
    /// malformed record) becomes a normal verdict, so the caller's
    /// exit-code logic stays uniform.
    pub async fn run(
        queue: &BuildQueue,
        raw_target: &str,
        config: &CheckConfig,
    ) -> anyhow::Result<CheckVerdict> {
        let target = match BuildTarget::parse(raw_target) {
            Ok(target) => target,
            Err(err) => {
                debug!(input = raw_target, "Malformed build target");
                return Ok(CheckVerdict::from_failure(err.to_string()));
            }
        };

        let verdict = match locate_build(queue, &target, config.timeout).await? {
            LocatedBuild::Found(build) => evaluate_build(&build, config),
            LocatedBuild::Missing(explanation) => CheckVerdict::from_failure(explanation),
        };

        info!(
            passed = verdict.passed(),
            flagged = verdict.flagged.len(),
            unexpected = verdict.unexpected.len(),
            "Check finished"
        );
        Ok(verdict)
    }
}
