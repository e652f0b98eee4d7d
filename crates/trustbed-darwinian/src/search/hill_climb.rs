//! Single-lineage hill climbing for one reporter
//!
//! The champion only changes when a mutant scores strictly higher on the
//! held-out partition, so the recorded accuracy history never decreases.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use trustbed_common::{CancelToken, Note, ReportRecord, Result, TrainingError};

use crate::classifier::{samples, Classifier, ClassifierFactory, Features};
use crate::fitness::accuracy;
use crate::genome::{Genome, GenomeDistribution, Mutator};
use crate::SearchConfig;

/// Why a climb ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    TargetReached,
    IterationLimit,
    TimeBudget,
}

/// Champion of one reporter's climb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub reporter: usize,
    pub genome: Genome,
    /// Held-out accuracy of the champion
    pub accuracy: f64,
    /// Mutants evaluated
    pub iterations: u32,
    /// Champion accuracy after initialization and after each iteration
    pub history: Vec<f64>,
    pub stopped: StopReason,
}

/// Hill climber over classifier hyperparameters
pub struct HillClimber<F> {
    config: SearchConfig,
    factory: F,
    distribution: GenomeDistribution,
    mutator: Mutator,
    cancel: CancelToken,
}

impl<F: ClassifierFactory> HillClimber<F> {
    pub fn new(config: SearchConfig, factory: F) -> Result<Self> {
        config.validate()?;
        let distribution = GenomeDistribution::from_config(&config)?;
        let mutator = Mutator::from_config(&config);
        Ok(Self {
            config,
            factory,
            distribution,
            mutator,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub(crate) fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Search one reporter's hyperparameters
    #[instrument(skip(self, train, test, rng), fields(train = train.len(), test = test.len()))]
    pub fn climb<R: Rng + ?Sized>(
        &self,
        reporter: usize,
        train: &[ReportRecord],
        test: &[ReportRecord],
        rng: &mut R,
    ) -> Result<SearchOutcome> {
        if train.is_empty() {
            return Err(TrainingError::EmptyPartition {
                reporter,
                partition: "training",
            }
            .into());
        }
        if test.is_empty() {
            return Err(TrainingError::EmptyPartition {
                reporter,
                partition: "held-out",
            }
            .into());
        }
        let train = samples(train);
        let test = samples(test);

        let started = Instant::now();
        let budget = self.config.time_budget_secs.map(Duration::from_secs);

        let mut champion = Genome::sample(reporter, &self.distribution, rng)?;
        let mut best = self.evaluate(&champion, &train, &test)?;
        let mut history = vec![best];
        let mut iterations = 0u32;

        let stopped = loop {
            if best >= self.config.target_accuracy {
                break StopReason::TargetReached;
            }
            if iterations >= self.config.max_iterations {
                break StopReason::IterationLimit;
            }
            if budget.is_some_and(|b| started.elapsed() >= b) {
                warn!(reporter, iterations, "Search time budget exhausted");
                break StopReason::TimeBudget;
            }
            self.cancel.check("hill climb")?;

            let mutant = champion.mutate(&self.mutator, &self.distribution, rng)?;
            let score = self.evaluate(&mutant, &train, &test)?;
            iterations += 1;

            if score > best {
                debug!(
                    reporter,
                    iteration = iterations,
                    accuracy = score,
                    regularization = mutant.regularization(),
                    kernel_width = mutant.kernel_width(),
                    "New champion"
                );
                champion = mutant;
                best = score;
            }
            history.push(best);
        };

        info!(
            reporter,
            accuracy = best,
            iterations,
            stopped = ?stopped,
            "Climb finished"
        );

        Ok(SearchOutcome {
            reporter,
            genome: champion,
            accuracy: best,
            iterations,
            history,
            stopped,
        })
    }

    /// Climb, then fit a classifier with the champion genome
    pub fn evolve<R: Rng + ?Sized>(
        &self,
        reporter: usize,
        train: &[ReportRecord],
        test: &[ReportRecord],
        rng: &mut R,
    ) -> Result<(SearchOutcome, F::Model)> {
        let outcome = self.climb(reporter, train, test, rng)?;
        let model = self.fit_genome(&outcome.genome, train)?;
        Ok((outcome, model))
    }

    /// Fit a fresh classifier with a genome's hyperparameters
    pub fn fit_genome(&self, genome: &Genome, train: &[ReportRecord]) -> Result<F::Model> {
        let mut model = self.factory.build(genome.hyperparameters());
        model
            .fit(&samples(train))
            .map_err(|e| e.for_reporter(genome.reporter()))?;
        Ok(model)
    }

    fn evaluate(
        &self,
        genome: &Genome,
        train: &[(Features, Note)],
        test: &[(Features, Note)],
    ) -> Result<f64> {
        let mut model = self.factory.build(genome.hyperparameters());
        model
            .fit(train)
            .map_err(|e| e.for_reporter(genome.reporter()))?;
        Ok(accuracy(&model, test))
    }
}
