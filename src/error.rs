//! Error types for the routing-topology harness
//!
//! Per-query failures (transport errors, timeouts) are carried inside the
//! result set and never surface through this type; only fundamental problems
//! such as a broken configuration or an empty registry abort a run.

use thiserror::Error;

/// Main error type for harness operations
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("Completion service error: {0}")]
    ServiceError(#[from] crate::completion::ServiceError),

    #[error("Registry error: {message}")]
    RegistryError { message: String },

    #[error("Query timed out after {secs}s")]
    QueryTimeout { secs: u64 },

    #[error("Report export failed: {0}")]
    ExportError(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl HarnessError {
    /// Create a registry error
    pub fn registry<S: Into<String>>(message: S) -> Self {
        Self::RegistryError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;
