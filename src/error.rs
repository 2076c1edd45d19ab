//! Error types for the timer tracker

use thiserror::Error;

use crate::state::TimerId;

/// Top-level error for store, clock and command handling
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Input rejected before any state change
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A command referenced a timer id the store does not hold
    #[error("Timer not found: {0}")]
    NotFound(TimerId),

    /// A completed timer was completed a second time
    #[error("Timer already completed: {0}")]
    AlreadyCompleted(TimerId),

    /// Durable storage read or write failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// The shared store mutex was poisoned
    #[error("Failed to lock timer store: {0}")]
    StateLock(String),
}

/// Rejected new-timer input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Enter a valid duration in seconds (got '{0}')")]
    InvalidDuration(String),
}

/// Storage failures, keyed by the record that was being read or written
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl<T> From<std::sync::PoisonError<T>> for TrackerError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        TrackerError::StateLock(err.to_string())
    }
}

/// Result type alias for TrackerError
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
