//! Error taxonomy shared by the pipeline, the scaler and the fitting tool.

use thiserror::Error;

/// Which side of the boundary a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad request content; the caller can fix it.
    Client,
    /// Artifact, model or startup problem.
    Server,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    #[error("invalid value for feature '{name}': {reason}")]
    InvalidFeature { name: String, reason: String },

    #[error("shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model inference failed: {0}")]
    ModelInference(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid fit data: {0}")]
    InvalidFitData(String),

    #[error("scaler artifact error: {0}")]
    Artifact(String),
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::InvalidFeature { .. } => ErrorKind::Client,
            _ => ErrorKind::Server,
        }
    }

    pub(crate) fn invalid_feature(name: &str, reason: impl Into<String>) -> Self {
        PredictError::InvalidFeature {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
