//! Core error types for liftoff-core.
//!
//! Every failure in the engine is recoverable: the host reports it to the
//! user and either retries or abandons the session.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::{Phase, SessionEvent};

/// Core error type for liftoff-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session state machine errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Submission latch refused a rewards submission
    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    /// Rewards service errors
    #[error("Rewards error: {0}")]
    Rewards(#[from] RewardsError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The plan has no exercises; the session never starts.
    #[error("Workout plan has no exercises")]
    EmptyPlan,

    /// An event arrived for a phase that does not accept it.
    #[error("Event '{event}' is not accepted while {phase}")]
    InvalidEvent { event: SessionEvent, phase: Phase },

    /// Completion data was requested before the terminal transition.
    #[error("Workout is not complete")]
    NotComplete,
}

/// Reasons the submission latch refuses to issue a rewards request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Workout is not complete")]
    NotComplete,

    #[error("A rewards submission is already in flight")]
    InFlight,

    #[error("Rewards were already submitted for this session")]
    AlreadySubmitted,

    #[error("Rewards submission failed {attempts} times; giving up")]
    AttemptsExhausted { attempts: u32 },
}

/// Rewards service errors. The session stays complete so the user may retry.
#[derive(Error, Debug)]
pub enum RewardsError {
    /// Transport failure
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service did not answer within the configured timeout
    #[error("Rewards service did not respond within {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status
    #[error("Rewards service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The service answered but refused the submission
    #[error("Rewards service rejected the submission: {0}")]
    Rejected(String),

    /// The response could not be interpreted
    #[error("Malformed rewards response: {0}")]
    Malformed(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Could not determine or create the data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Duplicate identifier
    #[error("Duplicate {collection} id '{id}'")]
    DuplicateId { collection: String, id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unsupported plan file format
    #[error("Unsupported plan format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
