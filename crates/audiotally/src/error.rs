//! Error types for audiotally.
//!
//! This module defines the error type used throughout the audiotally crate.
//! Nothing in the core is fatal: the worst outcome of any failure here is
//! "no result this tick", and the polling loop keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for audiotally operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// Failed to write the configuration file back to disk.
    #[error("failed to write configuration to {path}: {message}")]
    ConfigWrite {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of what went wrong.
        message: String,
    },

    // === Clipboard Errors ===
    /// The clipboard could not be read this tick.
    #[error("clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for audiotally operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl From<audiotally_clipboard::ClipboardError> for Error {
    fn from(err: audiotally_clipboard::ClipboardError) -> Self {
        match err {
            audiotally_clipboard::ClipboardError::Timeout(bound) => Self::Timeout {
                operation: format!("clipboard access ({}ms bound)", bound.as_millis()),
            },
            other => Self::ClipboardUnavailable(other.to_string()),
        }
    }
}

impl Error {
    /// Create a new clipboard-unavailable error.
    #[must_use]
    pub fn clipboard_unavailable(message: impl Into<String>) -> Self {
        Self::ClipboardUnavailable(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the clipboard was unreadable this tick.
    ///
    /// Such errors skip the tick and retain all cached state.
    #[must_use]
    pub fn is_clipboard_unavailable(&self) -> bool {
        matches!(self, Self::ClipboardUnavailable(_) | Self::Timeout { .. })
    }
}
