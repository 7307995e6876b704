//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the classification pipeline and its startup.
///
/// Only [`Error::InvalidInput`] can occur per request. Every other variant is
/// a startup-time failure: the configuration or the model artifact is unusable
/// and the process should not begin serving.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller did not supply a URL.
    #[error("No URL provided")]
    InvalidInput,

    /// The model was trained on a different feature schema than the extractor produces.
    #[error("model feature schema mismatch: expected {expected:?}, found {found:?}")]
    ModelContractMismatch {
        /// Field names the extractor emits, in order.
        expected: Vec<String>,
        /// Field names the artifact declares, in order.
        found: Vec<String>,
    },

    /// The model artifact is missing or corrupt.
    #[error("failed to load model from {path}: {reason}")]
    ModelLoadFailure {
        /// Path the artifact was read from.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Detector configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A brand pattern failed to compile.
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// IO error (e.g., reading a configuration file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error is the caller's fault rather than a setup problem.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput)
    }

    pub(crate) fn load_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::ModelLoadFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
