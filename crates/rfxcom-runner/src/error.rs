//! Error types for the runner.

use std::path::PathBuf;

use rfxcom_link::LinkError;
use thiserror::Error;

/// Errors that can occur running the host.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Configuration file could not be used.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// File that was being loaded.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error on a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transceiver or bridge failure.
    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Result type alias for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
