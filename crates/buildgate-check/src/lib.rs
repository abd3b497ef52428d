//! Buildgate check engine.
//!
//! Resolves an `actor/owner/repo/branch` tuple to a build record by racing
//! live queue watches against per-phase timeouts, then classifies the
//! resolved build's log output into a pass/fail verdict.

pub mod check;
pub mod locate;
pub mod verdict;

// Re-export key types
pub use check::BuildCheck;
pub use locate::{locate_build, next_event, LocatedBuild, WatchOutcome};
pub use verdict::{evaluate_build, CheckVerdict};
