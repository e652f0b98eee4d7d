//! Classifier capability
//!
//! A classifier learns to predict the note a reporter would give for a
//! demand. Training and prediction internals are behind [`Classifier`]; the
//! search only needs `fit`, `predict` and a factory that builds a fresh model
//! from a set of hyperparameters.

pub mod bundle;
pub mod kernel;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use trustbed_common::{Note, ReportRecord, TrainingError};

/// Classifier input for one report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub reporter: usize,
    pub subject: usize,
    pub service_target: u32,
    pub capability_target: u32,
}

impl Features {
    pub fn new(reporter: usize, subject: usize, service_target: u32, capability_target: u32) -> Self {
        Self {
            reporter,
            subject,
            service_target,
            capability_target,
        }
    }

    pub fn to_vector(&self) -> [f64; 4] {
        [
            self.reporter as f64,
            self.subject as f64,
            self.service_target as f64,
            self.capability_target as f64,
        ]
    }
}

impl From<&ReportRecord> for Features {
    fn from(record: &ReportRecord) -> Self {
        Self::new(
            record.reporter,
            record.subject,
            record.report.service_target,
            record.report.capability_target,
        )
    }
}

/// Labelled samples for fitting or scoring
pub fn samples(records: &[ReportRecord]) -> Vec<(Features, Note)> {
    records
        .iter()
        .map(|record| (Features::from(record), record.report.note))
        .collect()
}

/// Hyperparameters handed to a classifier factory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Regularization strength (C)
    pub regularization: f64,
    /// Kernel width (gamma)
    pub kernel_width: f64,
}

/// Errors raised while fitting a classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("no training samples")]
    Empty,

    #[error("training samples only contain note {0}")]
    SingleClass(Note),

    #[error("{0}")]
    Fit(String),
}

impl ClassifierError {
    /// Attach the reporter whose model failed
    pub fn for_reporter(self, reporter: usize) -> TrainingError {
        match self {
            ClassifierError::Empty => TrainingError::EmptyPartition {
                reporter,
                partition: "training",
            },
            ClassifierError::SingleClass(note) => TrainingError::SingleClass {
                reporter,
                note: note.value(),
            },
            ClassifierError::Fit(reason) => TrainingError::FitFailed { reporter, reason },
        }
    }

    /// Failure of the model shared by every reporter
    pub fn for_shared(self) -> TrainingError {
        TrainingError::SharedFitFailed {
            reason: self.to_string(),
        }
    }
}

/// Trainable note predictor
#[cfg_attr(test, mockall::automock)]
pub trait Classifier {
    /// Train on labelled samples, replacing any previous fit
    fn fit(&mut self, samples: &[(Features, Note)]) -> Result<(), ClassifierError>;

    /// Predict the note for one demand
    fn predict(&self, features: &Features) -> Note;
}

/// Builds untrained classifiers from hyperparameters
pub trait ClassifierFactory: Sync {
    type Model: Classifier + Send;

    fn build(&self, hyperparameters: Hyperparameters) -> Self::Model;
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustbed_common::Report;

    #[test]
    fn test_features_from_record() {
        let record = ReportRecord::new(3, 8, Report::new(40, 70, Note::Neutral, 2));
        let features = Features::from(&record);
        assert_eq!(features, Features::new(3, 8, 40, 70));
        assert_eq!(features.to_vector(), [3.0, 8.0, 40.0, 70.0]);

        let labelled = samples(&[record]);
        assert_eq!(labelled, vec![(features, Note::Neutral)]);
    }

    #[test]
    fn test_error_attaches_reporter() {
        assert_eq!(
            ClassifierError::SingleClass(Note::Negative).for_reporter(4),
            TrainingError::SingleClass {
                reporter: 4,
                note: -1
            }
        );
        assert!(matches!(
            ClassifierError::Empty.for_reporter(1),
            TrainingError::EmptyPartition { reporter: 1, .. }
        ));
        assert_eq!(ClassifierError::Fit("x".into()).for_shared().reporter(), None);
    }
}
