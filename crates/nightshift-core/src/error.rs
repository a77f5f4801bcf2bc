//! Core error types for nightshift-core.
//!
//! This module defines the error hierarchy using thiserror. Background
//! paths (the bedtime check, the schedule poller) never surface these --
//! they absorb and log. User-initiated operations propagate them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nightshift-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shield bridge errors
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
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

    /// A persisted record could not be decoded
    #[error("Corrupt record under key '{key}': {message}")]
    Corrupt { key: String, message: String },
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
}

/// Shield bridge errors.
///
/// The native module is opaque; these cover the only failure shapes the
/// core can observe across the seam.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The bridge is not available on this platform/build
    #[error("Shield bridge unavailable: {0}")]
    Unavailable(String),

    /// The native side rejected a command
    #[error("Bridge rejected '{command}': {message}")]
    Rejected { command: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Minutes-since-midnight out of range
    #[error("Invalid time of day: {0} (expected 0..1440 minutes)")]
    InvalidTimeOfDay(u32),

    /// Unparseable HH:MM string
    #[error("Invalid time string '{0}' (expected HH:MM)")]
    InvalidTimeString(String),

    /// Unknown day name
    #[error("Unknown day name '{0}'")]
    UnknownDay(String),

    /// Schedule id not found in the store
    #[error("No schedule with id '{0}'")]
    UnknownSchedule(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
