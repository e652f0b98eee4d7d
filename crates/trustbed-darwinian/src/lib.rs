//! # Darwinian
//!
//! Per-reporter hyperparameter search for the Trustbed classifiers.
//!
//! ## Search
//!
//! Single-lineage hill-climbing over a two-gene [`Genome`]
//! (regularization, kernel width):
//!
//! ```text
//! champion = sample()
//! while accuracy(champion) < target and iterations remain:
//!     mutant = normalize(mutate(champion))
//!     if accuracy(mutant) > accuracy(champion): champion = mutant
//! ```
//!
//! Fitness is held-out accuracy, so champion accuracy never decreases.
//! Reporters are searched independently and in parallel.

pub mod classifier;
pub mod fitness;
pub mod genome;
pub mod search;
pub mod store;

pub use classifier::bundle::ClassifierBundle;
pub use classifier::kernel::{KernelVoteClassifier, KernelVoteFactory};
pub use classifier::{Classifier, ClassifierError, ClassifierFactory, Features, Hyperparameters};
pub use fitness::{accuracy, bundle_accuracy};
pub use genome::{Genome, GenomeDistribution, Mutator};
pub use search::hill_climb::{HillClimber, SearchOutcome, StopReason};
pub use search::sweep::SweepReport;
pub use store::hyperlog::{read_hyperparameter_log, write_hyperparameter_log, HyperparameterRecord};
pub use store::models::ModelStore;

use serde::{Deserialize, Serialize};
use trustbed_common::{Result, TrustbedError, DEFAULT_TARGET_ACCURACY};

/// Search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Mean of the initial genome distribution
    pub init_mean: f64,
    /// Standard deviation of the initial genome distribution
    pub init_std_dev: f64,
    /// Consecutive non-positive draws tolerated per gene
    pub max_resample_attempts: u32,
    /// Mutation iterations per reporter
    pub max_iterations: u32,
    /// Held-out accuracy at which a climb stops early
    pub target_accuracy: f64,
    /// Upper bound of the per-iteration step scale
    pub step_scale: f64,
    /// Probability of an annealing step
    pub anneal_probability: f64,
    /// Standard deviation of an annealing step
    pub anneal_scale: f64,
    /// Wall-clock budget per reporter in seconds
    pub time_budget_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            init_mean: 1.0,
            init_std_dev: 1.0,
            max_resample_attempts: 1000,
            max_iterations: 50,
            target_accuracy: DEFAULT_TARGET_ACCURACY,
            step_scale: 0.5,
            anneal_probability: 0.05,
            anneal_scale: 5.0,
            time_budget_secs: None,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.init_std_dev > 0.0) || !self.init_mean.is_finite() {
            return Err(TrustbedError::Config(format!(
                "genome distribution N({}, {}) is invalid",
                self.init_mean, self.init_std_dev
            )));
        }
        if self.max_resample_attempts == 0 {
            return Err(TrustbedError::Config(
                "max_resample_attempts must be positive".to_string(),
            ));
        }
        if !(self.target_accuracy > 0.0 && self.target_accuracy <= 1.0) {
            return Err(TrustbedError::Config(format!(
                "target_accuracy must be within (0, 1], got {}",
                self.target_accuracy
            )));
        }
        if !(0.0..=1.0).contains(&self.anneal_probability) {
            return Err(TrustbedError::Config(format!(
                "anneal_probability must be within [0, 1], got {}",
                self.anneal_probability
            )));
        }
        if !(self.step_scale >= 0.0) || !(self.anneal_scale >= 0.0) {
            return Err(TrustbedError::Config(
                "mutation scales must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let cases = [
            SearchConfig {
                init_std_dev: 0.0,
                ..SearchConfig::default()
            },
            SearchConfig {
                target_accuracy: 1.5,
                ..SearchConfig::default()
            },
            SearchConfig {
                anneal_probability: -0.1,
                ..SearchConfig::default()
            },
            SearchConfig {
                max_resample_attempts: 0,
                ..SearchConfig::default()
            },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(TrustbedError::Config(_))));
        }
    }
}
