//! Three-phase build resolution.
//!
//! A build may already be finished before the checker starts watching (no
//! ongoing-build notification will ever fire), may start and finish inside
//! the watch window, or may be genuinely slow. Resolution therefore runs
//! in three phases, each bounded by the same configured window:
//!
//! 1. watch for an ongoing build (`end_time` absent)
//! 2. after one is seen, watch for its completion (`end_time` set)
//! 3. on either timeout, fall back to a direct lookup of the most recent
//!    completed record
//!
//! The fallback catches anything the watches missed due to
//! subscription-setup latency, so the caller never needs to know which
//! race applied.

use std::time::Duration;

use buildgate_core::BuildTarget;
use buildgate_state::{
    filter_description, Action, BuildQueue, BuildRecord, BuildStream, StateError,
};
use futures::StreamExt;
use tokio::time::{timeout_at, Instant};
use tracing::{info, instrument, warn};

/// Outcome of racing one watch stream against its window.
#[derive(Debug)]
pub enum WatchOutcome {
    /// A matching notification arrived first.
    Event(BuildRecord),
    /// The window elapsed first, or the server closed the stream.
    TimedOut,
}

/// Outcome of the three-phase resolution.
///
/// Never both and never neither: a check either has a record to classify
/// or a human-readable explanation of why none could be resolved.
#[derive(Debug)]
pub enum LocatedBuild {
    /// A build record was resolved.
    Found(BuildRecord),
    /// No build could be resolved.
    Missing(String),
}

/// Wait for the first usable notification on `stream`, racing it against
/// a window starting now.
///
/// Delete notifications are skipped; a deleted record cannot be the build
/// being waited for. The stream is consumed by value and dropped on every
/// return path, so the underlying live query ends exactly once whichever
/// side wins the race.
pub async fn next_event(
    mut stream: BuildStream,
    window: Duration,
) -> Result<WatchOutcome, StateError> {
    let deadline = Instant::now() + window;

    loop {
        match timeout_at(deadline, stream.next()).await {
            // The timer fired first.
            Err(_) => return Ok(WatchOutcome::TimedOut),
            // The server closed the live query.
            Ok(None) => return Ok(WatchOutcome::TimedOut),
            Ok(Some(Err(e))) => return Err(StateError::Subscription(e.to_string())),
            Ok(Some(Ok(notification))) => match notification.action {
                Action::Delete => continue,
                _ => return Ok(WatchOutcome::Event(notification.data)),
            },
        }
    }
}

/// Resolve `target` to a build record, or an explanation of why none
/// could be resolved.
#[instrument(skip(queue), fields(target = %target))]
pub async fn locate_build(
    queue: &BuildQueue,
    target: &BuildTarget,
    window: Duration,
) -> Result<LocatedBuild, StateError> {
    info!("Checking for ongoing build");
    let ongoing = queue.watch_ongoing(target).await?;

    match next_event(ongoing, window).await? {
        WatchOutcome::Event(build) => {
            info!(build_id = %build.build_id, "Ongoing build found. Waiting for build to complete");
            let completed = queue.watch_completed(target).await?;

            match next_event(completed, window).await? {
                WatchOutcome::Event(build) => {
                    info!(build_id = %build.build_id, "Build completed");
                    return Ok(LocatedBuild::Found(build));
                }
                WatchOutcome::TimedOut => {
                    warn!(
                        "Update never received: watch timed out after {}ms. Falling back to direct lookup",
                        window.as_millis()
                    );
                }
            }
        }
        WatchOutcome::TimedOut => {
            info!("No ongoing build found. Falling back to direct lookup");
        }
    }

    match queue.latest_completed(target).await? {
        Some(build) => {
            info!(build_id = %build.build_id, "Resolved via direct lookup");
            Ok(LocatedBuild::Found(build))
        }
        None => Ok(LocatedBuild::Missing(format!(
            "Nothing found for filter: {}\n\nThis might happen if the autobuilder is not set up on your fork.",
            filter_description(target)
        ))),
    }
}
