//! Kernel-weighted vote classifier
//!
//! Each class scores `Σ exp(-γ·‖x − xᵢ‖²)` over its support samples plus its
//! prior frequency divided by the regularization strength C. Features are
//! scaled by their training maxima, so γ is unitless. The highest score wins;
//! ties go to the lower note.

use serde::{Deserialize, Serialize};
use trustbed_common::Note;

use super::{Classifier, ClassifierError, ClassifierFactory, Features, Hyperparameters};

/// Support samples kept per model by default
pub const DEFAULT_MAX_SUPPORT: usize = 256;

const FEATURES: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelVoteClassifier {
    hyperparameters: Hyperparameters,
    max_support: usize,
    scale: [f64; FEATURES],
    support: Vec<([f64; FEATURES], Note)>,
    priors: [f64; 3],
}

impl KernelVoteClassifier {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self::with_max_support(hyperparameters, DEFAULT_MAX_SUPPORT)
    }

    pub fn with_max_support(hyperparameters: Hyperparameters, max_support: usize) -> Self {
        Self {
            hyperparameters,
            max_support: max_support.max(1),
            scale: [1.0; FEATURES],
            support: Vec::new(),
            priors: [0.0; 3],
        }
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters
    }

    pub fn is_fitted(&self) -> bool {
        !self.support.is_empty()
    }

    pub fn support_len(&self) -> usize {
        self.support.len()
    }

    fn scaled(&self, features: &Features) -> [f64; FEATURES] {
        let raw = features.to_vector();
        let mut out = [0.0; FEATURES];
        for (i, value) in raw.iter().enumerate() {
            out[i] = value / self.scale[i];
        }
        out
    }

    fn class_index(note: Note) -> usize {
        (note.value() + 1) as usize
    }
}

impl Classifier for KernelVoteClassifier {
    fn fit(&mut self, samples: &[(Features, Note)]) -> Result<(), ClassifierError> {
        let first = match samples.first() {
            Some((_, note)) => *note,
            None => return Err(ClassifierError::Empty),
        };
        if samples.iter().all(|(_, note)| *note == first) {
            return Err(ClassifierError::SingleClass(first));
        }

        let Hyperparameters {
            regularization,
            kernel_width,
        } = self.hyperparameters;
        if !(regularization > 0.0 && kernel_width > 0.0) {
            return Err(ClassifierError::Fit(format!(
                "hyperparameters must be positive, got C={} gamma={}",
                regularization, kernel_width
            )));
        }

        let mut scale = [1.0f64; FEATURES];
        let mut counts = [0usize; 3];
        for (features, note) in samples {
            for (i, value) in features.to_vector().iter().enumerate() {
                scale[i] = scale[i].max(*value);
            }
            counts[Self::class_index(*note)] += 1;
        }
        self.scale = scale;

        let total = samples.len() as f64;
        for (prior, count) in self.priors.iter_mut().zip(counts) {
            *prior = count as f64 / total;
        }

        // Evenly strided subsample keeps every region of the log represented
        let stride = samples.len().div_ceil(self.max_support);
        self.support = samples
            .iter()
            .step_by(stride)
            .map(|(features, note)| (self.scaled(features), *note))
            .collect();

        Ok(())
    }

    fn predict(&self, features: &Features) -> Note {
        if self.support.is_empty() {
            return Note::Negative;
        }

        let x = self.scaled(features);
        let gamma = self.hyperparameters.kernel_width;
        let mut scores = self.priors.map(|p| p / self.hyperparameters.regularization);
        for (xi, note) in &self.support {
            let distance: f64 = x.iter().zip(xi).map(|(a, b)| (a - b) * (a - b)).sum();
            scores[Self::class_index(*note)] += (-gamma * distance).exp();
        }

        let mut best = 0;
        for (i, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = i;
            }
        }
        Note::ALL[best]
    }
}

/// Factory for [`KernelVoteClassifier`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelVoteFactory {
    max_support: usize,
}

impl KernelVoteFactory {
    pub fn new(max_support: usize) -> Self {
        Self { max_support }
    }
}

impl Default for KernelVoteFactory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUPPORT)
    }
}

impl ClassifierFactory for KernelVoteFactory {
    type Model = KernelVoteClassifier;

    fn build(&self, hyperparameters: Hyperparameters) -> KernelVoteClassifier {
        KernelVoteClassifier::with_max_support(hyperparameters, self.max_support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hp(regularization: f64, kernel_width: f64) -> Hyperparameters {
        Hyperparameters {
            regularization,
            kernel_width,
        }
    }

    /// Reporter 0 rating subject 1 (capacities 50/50) on a grid of demands
    fn capacity_samples() -> Vec<(Features, Note)> {
        let mut samples = Vec::new();
        for s in (0..=100).step_by(10) {
            for c in (0..=100).step_by(10) {
                let note = match (s <= 50, c <= 50) {
                    (true, true) => Note::Positive,
                    (false, false) => Note::Negative,
                    _ => Note::Neutral,
                };
                samples.push((Features::new(0, 1, s, c), note));
            }
        }
        samples
    }

    #[test]
    fn test_rejects_empty_and_single_class() {
        let mut model = KernelVoteClassifier::new(hp(1.0, 1.0));
        assert_eq!(model.fit(&[]), Err(ClassifierError::Empty));

        let samples = vec![
            (Features::new(0, 1, 10, 10), Note::Negative),
            (Features::new(0, 2, 20, 20), Note::Negative),
        ];
        assert_eq!(
            model.fit(&samples),
            Err(ClassifierError::SingleClass(Note::Negative))
        );
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_unfitted_predicts_negative() {
        let model = KernelVoteClassifier::new(hp(1.0, 1.0));
        assert_eq!(model.predict(&Features::new(0, 1, 0, 0)), Note::Negative);
    }

    #[test]
    fn test_learns_capacity_regions() {
        let samples = capacity_samples();
        let mut model = KernelVoteClassifier::new(hp(10.0, 50.0));
        model.fit(&samples).unwrap();

        assert_eq!(model.predict(&Features::new(0, 1, 10, 10)), Note::Positive);
        assert_eq!(model.predict(&Features::new(0, 1, 90, 90)), Note::Negative);
        assert_eq!(model.predict(&Features::new(0, 1, 90, 10)), Note::Neutral);
    }

    #[test]
    fn test_support_is_capped() {
        let samples = capacity_samples();
        let mut model = KernelVoteFactory::new(10).build(hp(1.0, 1.0));
        model.fit(&samples).unwrap();
        assert!(model.support_len() <= 10);
        assert!(model.is_fitted());
    }

    #[test]
    fn test_non_positive_hyperparameters_fail() {
        let mut model = KernelVoteClassifier::new(hp(0.0, 1.0));
        assert!(matches!(
            model.fit(&capacity_samples()),
            Err(ClassifierError::Fit(_))
        ));
    }
}
