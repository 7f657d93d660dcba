//! Core error types for ritualtrack-core.
//!
//! This module defines the error hierarchy using thiserror. Failures in this
//! crate are never fatal: they all mean "state did not change, try again".

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ritualtrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

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

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
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

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Backend could not be reached
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    /// A persisted snapshot could not be read back
    #[error("Corrupt snapshot at {path}: {message}")]
    CorruptSnapshot { path: PathBuf, message: String },
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors for protocol definitions.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Phase ranges do not tile the journey from day 1
    #[error("Phase '{phase}' starts at day {start_day}, expected day {expected}")]
    PhaseGap {
        phase: String,
        start_day: u32,
        expected: u32,
    },

    /// Phase end precedes its start
    #[error("Phase '{phase}' ends at day {end_day} before it starts at day {start_day}")]
    InvertedPhase {
        phase: String,
        start_day: u32,
        end_day: u32,
    },

    /// Only the final phase may be open-ended
    #[error("Phase '{0}' is unbounded but is not the last phase")]
    UnboundedNotLast(String),

    /// The final phase must be open-ended
    #[error("Last phase '{0}' must be unbounded")]
    BoundedTail(String),

    /// Duplicate identifier
    #[error("Duplicate {collection} id: {id}")]
    DuplicateId { collection: String, id: String },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
