//! Error types for heartrisk

use thiserror::Error;

use crate::form::RangeViolation;

/// Errors that can occur while training, loading or predicting
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Failed to load model artifact {path}: {reason}")]
    ArtifactLoad { path: String, reason: String },

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Dimension mismatch: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Input out of range: {}", join_violations(.0))]
    InputOutOfRange(Vec<RangeViolation>),

    #[error("Invalid dataset: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RiskError {
    pub(crate) fn artifact(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        RiskError::ArtifactLoad {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

fn join_violations(violations: &[RangeViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
