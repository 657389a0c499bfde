use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a predictive model unit.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Prediction requested before fitting or loading.
    #[error("model {0} has not been fitted")]
    NotFitted(String),
    /// Too few samples to fit.
    #[error("need at least {needed} samples to fit {model}, got {got}")]
    InsufficientSamples {
        /// Model name.
        model: String,
        /// Minimum sample count.
        needed: usize,
        /// Samples supplied.
        got: usize,
    },
    /// Feature rows and targets disagree in length.
    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch {
        /// Feature row count.
        features: usize,
        /// Target count.
        targets: usize,
    },
    /// Persisted parameters do not match the feature layout.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected width.
        expected: usize,
        /// Width found.
        got: usize,
    },
    /// Fitting produced NaN or infinite parameters.
    #[error("fitting {0} diverged")]
    Diverged(String),
    /// The trainable backend was requested but is not compiled in.
    #[error("trainable model backend is not available in this build")]
    BackendUnavailable,
    /// Filesystem failure while persisting or loading.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Encoding failure while persisting or loading.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures that abort a whole training batch.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// The model directory could not be created.
    #[error("preparing model directory {path}: {source}")]
    ModelDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Fitted state could not be written.
    #[error("persisting trained models: {0}")]
    Persist(#[from] ModelError),
}
