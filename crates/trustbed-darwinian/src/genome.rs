//! Genome - a candidate pair of classifier hyperparameters
//!
//! Both genes are strictly positive once a genome exists. Non-positive draws,
//! whether from initialization or mutation, are replaced by fresh draws from
//! the initial distribution.

use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};
use trustbed_common::{Result, TrustbedError};

use crate::classifier::Hyperparameters;
use crate::SearchConfig;

/// Normal distribution of initial genes with a bounded resample budget
#[derive(Debug, Clone, Copy)]
pub struct GenomeDistribution {
    normal: Normal<f64>,
    mean: f64,
    std_dev: f64,
    max_attempts: u32,
}

impl GenomeDistribution {
    pub fn new(mean: f64, std_dev: f64, max_attempts: u32) -> Result<Self> {
        let normal = Normal::new(mean, std_dev).map_err(|e| {
            TrustbedError::Config(format!("genome distribution N({mean}, {std_dev}): {e}"))
        })?;
        Ok(Self {
            normal,
            mean,
            std_dev,
            max_attempts,
        })
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Self::new(
            config.init_mean,
            config.init_std_dev,
            config.max_resample_attempts,
        )
    }

    /// Draw until a strictly positive, finite value appears
    pub fn positive_draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        for _ in 0..self.max_attempts {
            let value = self.normal.sample(rng);
            if value > 0.0 && value.is_finite() {
                return Ok(value);
            }
        }
        Err(TrustbedError::Config(format!(
            "genome distribution N({}, {}) produced no positive value in {} draws",
            self.mean, self.std_dev, self.max_attempts
        )))
    }

    /// Keep a positive gene, redraw anything else
    pub fn normalize<R: Rng + ?Sized>(&self, value: f64, rng: &mut R) -> Result<f64> {
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            self.positive_draw(rng)
        }
    }
}

/// Gaussian mutation with occasional annealing jumps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutator {
    step_scale: f64,
    anneal_probability: f64,
    anneal_scale: f64,
}

impl Mutator {
    pub fn new(step_scale: f64, anneal_probability: f64, anneal_scale: f64) -> Self {
        Self {
            step_scale: step_scale.max(0.0),
            anneal_probability: anneal_probability.clamp(0.0, 1.0),
            anneal_scale: anneal_scale.max(0.0),
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(
            config.step_scale,
            config.anneal_probability,
            config.anneal_scale,
        )
    }

    /// Standard deviation for this iteration's steps
    ///
    /// Uniform in `[0, step_scale)`, or `anneal_scale` with probability
    /// `anneal_probability`.
    pub fn iteration_scale<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if rng.gen_bool(self.anneal_probability) {
            self.anneal_scale
        } else {
            rng.gen::<f64>() * self.step_scale
        }
    }
}

/// Hyperparameter genome for one reporter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    reporter: usize,
    regularization: f64,
    kernel_width: f64,
}

impl Genome {
    /// Build a genome from known-good genes
    pub fn new(reporter: usize, regularization: f64, kernel_width: f64) -> Result<Self> {
        for (name, value) in [("regularization", regularization), ("kernel_width", kernel_width)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(TrustbedError::Config(format!(
                    "genome {} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            reporter,
            regularization,
            kernel_width,
        })
    }

    /// Sample an initial genome
    pub fn sample<R: Rng + ?Sized>(
        reporter: usize,
        distribution: &GenomeDistribution,
        rng: &mut R,
    ) -> Result<Self> {
        let regularization = distribution.positive_draw(rng)?;
        let kernel_width = distribution.positive_draw(rng)?;
        Self::new(reporter, regularization, kernel_width)
    }

    /// Perturb both genes and normalize the result
    pub fn mutate<R: Rng + ?Sized>(
        &self,
        mutator: &Mutator,
        distribution: &GenomeDistribution,
        rng: &mut R,
    ) -> Result<Self> {
        let scale = mutator.iteration_scale(rng);
        let regularization_step: f64 = StandardNormal.sample(rng);
        let kernel_width_step: f64 = StandardNormal.sample(rng);

        let regularization =
            distribution.normalize(self.regularization + regularization_step * scale, rng)?;
        let kernel_width =
            distribution.normalize(self.kernel_width + kernel_width_step * scale, rng)?;
        Self::new(self.reporter, regularization, kernel_width)
    }

    pub fn reporter(&self) -> usize {
        self.reporter
    }

    pub fn regularization(&self) -> f64 {
        self.regularization
    }

    pub fn kernel_width(&self) -> f64 {
        self.kernel_width
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            regularization: self.regularization,
            kernel_width: self.kernel_width,
        }
    }
}
