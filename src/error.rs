//! Error types for nestkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using NestError
pub type Result<T> = std::result::Result<T, NestError>;

/// Unified error type for nestkv operations
#[derive(Debug, Error)]
pub enum NestError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Command Errors
    // -------------------------------------------------------------------------
    /// A verb handler received a payload of the wrong shape
    #[error("Invalid arguments for {verb}: {reason}")]
    InvalidArguments { verb: String, reason: String },

    // -------------------------------------------------------------------------
    // Backend Errors
    // -------------------------------------------------------------------------
    /// The remote store answered with an error status
    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Backend error: {0}")]
    Backend(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl NestError {
    /// Shorthand for a payload-shape failure on `verb`
    pub fn invalid_arguments(verb: impl Into<String>, reason: impl Into<String>) -> Self {
        NestError::InvalidArguments {
            verb: verb.into(),
            reason: reason.into(),
        }
    }
}
