//! Custom error types for piholesync
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every error is terminal: the binary prints
//! it and exits with status 1.

use thiserror::Error;

/// The main error type for piholesync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// Malformed INI document, missing keys, or an unknown host reference
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command line usage
    #[error("Argument error: {0}")]
    Argument(String),

    /// Missing file, directory, or backup archive
    #[error("Could not find {entity_type} {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The admin portal did not hand out a session token
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// HTTP or I/O failure while moving an archive
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Local file I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl SyncError {
    /// Create a "not found" error for a host section referenced by key
    pub fn host_not_found(key: impl Into<String>) -> Self {
        Self::Config(format!("Host section [{}] not found in INI file.", key.into()))
    }

    /// Create a "not found" error for a backup archive
    pub fn archive_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "backup archive",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transfer(err.to_string())
    }
}

/// Result type alias for piholesync operations
pub type SyncResult<T> = Result<T, SyncError>;
