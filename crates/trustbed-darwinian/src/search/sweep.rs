//! Parallel per-reporter sweep
//!
//! Every reporter of the training corpus is climbed on its own seed stream.
//! A training failure abandons that reporter only; anything else (bad
//! configuration, cancellation) aborts the sweep.

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{info, instrument, warn};
use trustbed_common::{Result, SeedSource, TrainingError, TrustbedError};
use trustbed_ledger::ReportCorpus;

use super::hill_climb::{HillClimber, SearchOutcome};
use crate::classifier::bundle::ClassifierBundle;
use crate::classifier::ClassifierFactory;
use crate::store::hyperlog::HyperparameterRecord;

const CLIMB_DOMAIN: &str = "search/climb";

/// Result of a sweep over all reporters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Champions in ascending reporter order
    pub champions: Vec<SearchOutcome>,
    /// Reporters whose search was abandoned
    pub failures: Vec<TrainingError>,
}

impl SweepReport {
    pub fn champion(&self, reporter: usize) -> Option<&SearchOutcome> {
        self.champions.iter().find(|o| o.reporter == reporter)
    }

    /// Hyperparameter log lines for every champion
    pub fn records(&self) -> Vec<HyperparameterRecord> {
        self.champions
            .iter()
            .map(|o| HyperparameterRecord::new(&o.genome, o.accuracy))
            .collect()
    }

    /// Mean champion accuracy, 0 when nothing was tuned
    pub fn mean_accuracy(&self) -> f64 {
        if self.champions.is_empty() {
            return 0.0;
        }
        self.champions.iter().map(|o| o.accuracy).sum::<f64>() / self.champions.len() as f64
    }
}

impl<F: ClassifierFactory> HillClimber<F> {
    /// Climb every reporter of `train`, scoring against the same reporter in `test`
    #[instrument(skip_all, fields(reporters = train.reporters().len(), seed = seeds.seed()))]
    pub fn sweep(
        &self,
        train: &ReportCorpus,
        test: &ReportCorpus,
        seeds: &SeedSource,
    ) -> Result<SweepReport> {
        let results: Vec<Result<SearchOutcome>> = train
            .reporters()
            .into_par_iter()
            .map(|reporter| {
                self.cancel_token().check("sweep")?;
                let mut rng = seeds.stream(CLIMB_DOMAIN, reporter as u64);
                self.climb(
                    reporter,
                    train.partition(reporter),
                    test.partition(reporter),
                    &mut rng,
                )
            })
            .collect();

        let mut report = SweepReport::default();
        for result in results {
            match result {
                Ok(outcome) => report.champions.push(outcome),
                Err(TrustbedError::Training(err)) => {
                    warn!(error = %err, "Reporter search abandoned");
                    report.failures.push(err);
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            champions = report.champions.len(),
            failures = report.failures.len(),
            mean_accuracy = report.mean_accuracy(),
            "Sweep finished"
        );
        Ok(report)
    }

    /// Sweep, then fit one classifier per champion
    pub fn evolve_all(
        &self,
        train: &ReportCorpus,
        test: &ReportCorpus,
        seeds: &SeedSource,
    ) -> Result<(SweepReport, ClassifierBundle<F::Model>)> {
        let report = self.sweep(train, test, seeds)?;
        let models: BTreeMap<usize, F::Model> = report
            .champions
            .par_iter()
            .map(|outcome| {
                self.fit_genome(&outcome.genome, train.partition(outcome.reporter))
                    .map(|model| (outcome.reporter, model))
            })
            .collect::<Result<_>>()?;
        Ok((report, ClassifierBundle::PerReporter(models)))
    }
}
