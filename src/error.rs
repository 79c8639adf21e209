//! Error handling for the fleet provisioner
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the library surface should use these types for consistency.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fleet provisioning and launch sequencing
#[derive(Error, Debug)]
pub enum FleetError {
    /// IO errors (directory creation, file writes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Provisioning failure for a specific node, wrapping the underlying IO error
    #[error("provisioning node {id} failed during {operation}: {source}")]
    Provision {
        id: u32,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Launch spawn errors (executable missing or not runnable)
    #[error("failed to spawn node {id} ({program}): {source}")]
    Spawn {
        id: u32,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Properties file parse errors
    #[error("Properties error: {0}")]
    Properties(String),
}

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, FleetError>;

impl FleetError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a properties parse error
    pub fn properties(msg: impl Into<String>) -> Self {
        Self::Properties(msg.into())
    }

    /// Wrap an IO error with the node id and operation that hit it
    pub fn provision(id: u32, operation: &'static str, source: std::io::Error) -> Self {
        Self::Provision {
            id,
            operation,
            source,
        }
    }
}
