//! Error types for buildgate-state

use thiserror::Error;

/// Errors that can occur in the queue persistence layer
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Queue connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Queue query failed: {0}")]
    Query(String),

    /// Live-query subscription error
    #[error("Queue subscription failed: {0}")]
    Subscription(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// No record with the given build ID
    #[error("Build not found: {0}")]
    BuildNotFound(String),

    /// Transaction failed
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}
