//! Error types for Trustbed
//!
//! Provides a unified error type and domain-specific error variants

use thiserror::Error;

/// Result type alias using TrustbedError
pub type Result<T> = std::result::Result<T, TrustbedError>;

/// Unified error type for Trustbed operations
#[derive(Debug, Error)]
pub enum TrustbedError {
    // Report data errors
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    // Per-reporter training errors
    #[error("Training error: {0}")]
    Training(#[from] TrainingError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Cooperative cancellation
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Report data errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("Report log unavailable: {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("Malformed record at {path}:{line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid note value: {0}")]
    InvalidNote(i64),

    #[error("Node {id} out of range for a network of {size}")]
    NodeOutOfRange { id: usize, size: usize },

    #[error("Node {0} cannot report on itself")]
    SelfReport(usize),
}

/// Training errors, always tied to one reporter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("Reporter {reporter} has no {partition} samples")]
    EmptyPartition {
        reporter: usize,
        partition: &'static str,
    },

    #[error("Reporter {reporter} only reported a single note class ({note})")]
    SingleClass { reporter: usize, note: i8 },

    #[error("Classifier fit failed for reporter {reporter}: {reason}")]
    FitFailed { reporter: usize, reason: String },

    #[error("Shared classifier fit failed: {reason}")]
    SharedFitFailed { reason: String },
}

impl TrainingError {
    /// Reporter whose search was abandoned; `None` for the shared model
    pub fn reporter(&self) -> Option<usize> {
        match self {
            TrainingError::EmptyPartition { reporter, .. }
            | TrainingError::SingleClass { reporter, .. }
            | TrainingError::FitFailed { reporter, .. } => Some(*reporter),
            TrainingError::SharedFitFailed { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TrustbedError {
    fn from(err: serde_json::Error) -> Self {
        TrustbedError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TrustbedError {
    fn from(err: std::io::Error) -> Self {
        TrustbedError::Storage(err.to_string())
    }
}

impl From<anyhow::Error> for TrustbedError {
    fn from(err: anyhow::Error) -> Self {
        TrustbedError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TrustbedError::Data(DataError::Unavailable {
            path: "reports-train.csv".to_string(),
            reason: "No such file or directory".to_string(),
        });
        assert!(err.to_string().contains("reports-train.csv"));
    }

    #[test]
    fn test_training_error_reporter() {
        let err = TrainingError::SingleClass {
            reporter: 7,
            note: 1,
        };
        assert_eq!(err.reporter(), Some(7));
        assert!(err.to_string().contains("Reporter 7"));
    }
}
