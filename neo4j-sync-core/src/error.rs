//! Error types for sync operations

use thiserror::Error;

/// Errors that can abort a sync run
///
/// An unresolved relationship endpoint is deliberately absent here: it is
/// reported through [`crate::PhaseReport::unresolved`] instead.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A store could not be reached
    #[error("Failed to connect to graph store: {0}")]
    Connection(String),

    /// The store rejected or failed a statement
    #[error("Query failed: {0}")]
    Query(String),

    /// A result row did not have the expected shape
    #[error("Failed to decode result row: {0}")]
    Decode(String),

    /// Invalid run options
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A dispatched write task panicked or was cancelled
    #[error("Write task failed to complete: {0}")]
    Dispatch(String),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
