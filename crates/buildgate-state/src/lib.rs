//! SurrealDB backend for the shared documentation-build queue.
//!
//! The external build worker owns every record in the `queue` table; the
//! checker only reads them. This crate provides the read side (live-query
//! watches and the most-recent-completed lookup) plus the worker-side
//! writes that tests and tooling use to simulate the worker.

pub mod error;
pub mod migrations;
pub mod queue;
pub mod record;

pub use error::StateError;
pub use queue::{filter_description, BuildQueue, BuildStream, QueueConfig};
pub use record::{BuildFailure, BuildPayload, BuildRecord, BuildStatus};

// Notification vocabulary for consumers of [`BuildStream`].
pub use surrealdb::{Action, Notification};

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, StateError>;
