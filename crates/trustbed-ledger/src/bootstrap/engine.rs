//! Bootstrap engine
//!
//! Each epoch every ordered pair `(i, j)`, `i != j`, transacts once: `i`
//! draws a demand, rates `j`, and the report replaces `matrix[i][j]`. Rows
//! are generated in parallel, each from its own random stream, then applied
//! in row-major order so the result is independent of scheduling.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use trustbed_common::{CancelToken, ReportRecord, Result, SeedSource};

use crate::log::csv::ReportSink;
use crate::matrix::ReportMatrix;
use crate::population::network::Network;
use crate::{BootstrapConfig, TargetRanges};

/// Stream domain of the training corpus
pub const TRAIN_DOMAIN: &str = "bootstrap/train";

/// Stream domain of the held-out corpus
pub const TEST_DOMAIN: &str = "bootstrap/test";

/// Outcome of a bootstrap run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// Epochs fully generated
    pub epochs_completed: u32,
    /// Epochs requested
    pub epochs_requested: u32,
    /// Reports generated across all epochs and corpora
    pub reports_generated: u64,
    /// Whether the time budget cut the run short
    pub truncated: bool,
    pub elapsed_ms: u64,
}

/// Training and held-out matrices produced side by side
#[derive(Debug, Clone)]
pub struct Corpora {
    pub train: ReportMatrix,
    pub test: ReportMatrix,
    pub summary: BootstrapSummary,
}

/// All-pairs report generator
pub struct BootstrapEngine {
    targets: TargetRanges,
    seeds: SeedSource,
    cancel: CancelToken,
    time_budget: Option<Duration>,
}

impl BootstrapEngine {
    pub fn new(targets: TargetRanges, seeds: SeedSource) -> Self {
        Self {
            targets,
            seeds,
            cancel: CancelToken::new(),
            time_budget: None,
        }
    }

    pub fn from_config(config: &BootstrapConfig, seeds: SeedSource) -> Self {
        let engine = Self::new(config.targets, seeds);
        match config.time_budget_secs {
            Some(secs) => engine.with_time_budget(Duration::from_secs(secs)),
            None => engine,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Run `epochs` epochs into `matrix`, appending each epoch to `sink`
    #[instrument(skip(self, network, matrix, sink), fields(nodes = network.len()))]
    pub fn run_epochs(
        &self,
        network: &Network,
        matrix: &mut ReportMatrix,
        epochs: u32,
        mut sink: Option<&mut dyn ReportSink>,
    ) -> Result<BootstrapSummary> {
        self.targets.validate()?;
        let started = Instant::now();
        let mut summary = BootstrapSummary {
            epochs_requested: epochs,
            ..BootstrapSummary::default()
        };

        info!(epochs, "Bootstrapping network");
        for epoch in 1..=epochs {
            if !self.begin_epoch(epoch, started, &mut summary)? {
                break;
            }
            let records = self.run_epoch(network, matrix, epoch, TRAIN_DOMAIN)?;
            if let Some(sink) = sink.as_mut() {
                sink.append(&records)?;
            }
            summary.reports_generated += records.len() as u64;
            summary.epochs_completed = epoch;
            log_progress(epoch, epochs);
        }

        if let Some(sink) = sink {
            sink.flush()?;
        }
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            epochs = summary.epochs_completed,
            reports = summary.reports_generated,
            "Bootstrap done"
        );
        Ok(summary)
    }

    /// Generate independent training and held-out corpora
    ///
    /// Each epoch runs the all-pairs procedure twice, once per corpus, with
    /// independent random streams.
    #[instrument(skip(self, network, train_sink, test_sink), fields(nodes = network.len()))]
    pub fn generate_corpora(
        &self,
        network: &Network,
        epochs: u32,
        train_sink: &mut dyn ReportSink,
        test_sink: &mut dyn ReportSink,
    ) -> Result<Corpora> {
        self.targets.validate()?;
        let started = Instant::now();
        let mut train = ReportMatrix::new(network.len());
        let mut test = ReportMatrix::new(network.len());
        let mut summary = BootstrapSummary {
            epochs_requested: epochs,
            ..BootstrapSummary::default()
        };

        info!(epochs, "Generating training and held-out corpora");
        for epoch in 1..=epochs {
            if !self.begin_epoch(epoch, started, &mut summary)? {
                break;
            }
            let train_records = self.run_epoch(network, &mut train, epoch, TRAIN_DOMAIN)?;
            train_sink.append(&train_records)?;
            let test_records = self.run_epoch(network, &mut test, epoch, TEST_DOMAIN)?;
            test_sink.append(&test_records)?;
            summary.reports_generated += (train_records.len() + test_records.len()) as u64;
            summary.epochs_completed = epoch;
            log_progress(epoch, epochs);
        }

        train_sink.flush()?;
        test_sink.flush()?;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            epochs = summary.epochs_completed,
            reports = summary.reports_generated,
            "Corpus generation done"
        );
        Ok(Corpora {
            train,
            test,
            summary,
        })
    }

    /// Run one epoch for one stream domain into `matrix`
    ///
    /// Returns the epoch's reports in row-major order for logging.
    pub fn run_epoch(
        &self,
        network: &Network,
        matrix: &mut ReportMatrix,
        epoch: u32,
        domain: &str,
    ) -> Result<Vec<ReportRecord>> {
        let records = self.epoch_records(network, epoch, domain);
        for record in &records {
            matrix.apply(record)?;
        }
        debug!(epoch, domain, reports = records.len(), "Epoch generated");
        Ok(records)
    }

    fn epoch_records(&self, network: &Network, epoch: u32, domain: &str) -> Vec<ReportRecord> {
        let epoch_seeds = self.seeds.derive(domain, u64::from(epoch));
        let nodes = network.nodes();

        let rows: Vec<Vec<ReportRecord>> = (0..nodes.len())
            .into_par_iter()
            .map(|reporter_id| {
                let mut rng = epoch_seeds.stream("reporter", reporter_id as u64);
                let reporter = &nodes[reporter_id];
                nodes
                    .iter()
                    .enumerate()
                    .filter(|(subject_id, _)| *subject_id != reporter_id)
                    .map(|(subject_id, subject)| {
                        let (service_target, capability_target) = self.targets.sample(&mut rng);
                        let report = reporter.send_report(
                            subject,
                            service_target,
                            capability_target,
                            epoch,
                            &mut rng,
                        );
                        ReportRecord::new(reporter_id, subject_id, report)
                    })
                    .collect()
            })
            .collect();

        rows.into_iter().flatten().collect()
    }

    /// Check cancellation and the time budget; `false` stops the run
    fn begin_epoch(
        &self,
        epoch: u32,
        started: Instant,
        summary: &mut BootstrapSummary,
    ) -> Result<bool> {
        self.cancel.check("bootstrap")?;
        if let Some(budget) = self.time_budget {
            if started.elapsed() >= budget {
                warn!(
                    epoch,
                    budget_secs = budget.as_secs(),
                    "Bootstrap time budget exhausted"
                );
                summary.truncated = true;
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn log_progress(epoch: u32, total: u32) {
    let scaled = u64::from(epoch) * 100;
    if scaled % u64::from(total) == 0 {
        info!(epoch, total, percent = scaled / u64::from(total), "Bootstrap progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::builder::PopulationBuilder;
    use crate::PopulationConfig;
    use rand::{rngs::StdRng, SeedableRng};
    use trustbed_common::{Node, Note, TrustbedError};

    fn uniform_network(n: usize) -> Network {
        PopulationBuilder::new(PopulationConfig::uniform(n))
            .build(&mut StdRng::seed_from_u64(0))
            .unwrap()
            .network
    }

    #[test]
    fn test_bootstrap() {
        let network = PopulationBuilder::new(PopulationConfig::default())
            .build(&mut StdRng::seed_from_u64(4))
            .unwrap()
            .network;
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(4));
        let mut matrix = ReportMatrix::new(network.len());

        let summary = engine.run_epochs(&network, &mut matrix, 5, None).unwrap();
        assert_eq!(matrix.shape(), (50, 50));
        assert!(matrix.is_complete());
        assert_eq!(summary.epochs_completed, 5);
        assert_eq!(summary.reports_generated, 5 * 50 * 49);
    }

    #[test]
    fn test_matrix_holds_latest_while_sink_holds_all() {
        let network = uniform_network(4);
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(1));
        let mut matrix = ReportMatrix::new(4);
        let mut log: Vec<ReportRecord> = Vec::new();

        engine
            .run_epochs(&network, &mut matrix, 3, Some(&mut log))
            .unwrap();

        assert_eq!(log.len(), 3 * 12);
        assert!(matrix.records().all(|r| r.report.epoch == 3));
        for epoch in 1..=3 {
            assert_eq!(log.iter().filter(|r| r.report.epoch == epoch).count(), 12);
        }
    }

    #[test]
    fn test_bootstrap_is_reproducible() {
        let network = PopulationBuilder::new(PopulationConfig::default())
            .build(&mut StdRng::seed_from_u64(8))
            .unwrap()
            .network;
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(8));

        let mut a = ReportMatrix::new(network.len());
        let mut b = ReportMatrix::new(network.len());
        engine.run_epochs(&network, &mut a, 2, None).unwrap();
        engine.run_epochs(&network, &mut b, 2, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_corpora_are_independent() {
        let network = uniform_network(6);
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(2));
        let mut train_log: Vec<ReportRecord> = Vec::new();
        let mut test_log: Vec<ReportRecord> = Vec::new();

        let corpora = engine
            .generate_corpora(&network, 2, &mut train_log, &mut test_log)
            .unwrap();

        assert!(corpora.train.is_complete());
        assert!(corpora.test.is_complete());
        assert_eq!(train_log.len(), test_log.len());
        assert_ne!(corpora.train, corpora.test);
        assert_eq!(corpora.summary.reports_generated, 2 * 2 * 30);
    }

    #[test]
    fn test_dishonest_reporter_always_negative() {
        let mut nodes = vec![Node::new(100, 100); 4];
        nodes[2] = Node::bad_mouther(100, 100);
        let network = Network::from_nodes(nodes);
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(3));
        let mut matrix = ReportMatrix::new(4);
        let mut log: Vec<ReportRecord> = Vec::new();

        engine
            .run_epochs(&network, &mut matrix, 3, Some(&mut log))
            .unwrap();

        let authored: Vec<_> = log.iter().filter(|r| r.reporter == 2).collect();
        assert_eq!(authored.len(), 9);
        assert!(authored.iter().all(|r| r.report.note == Note::Negative));
    }

    #[test]
    fn test_cancelled_bootstrap() {
        let network = uniform_network(4);
        let cancel = CancelToken::new();
        cancel.cancel();
        let engine =
            BootstrapEngine::new(TargetRanges::default(), SeedSource::new(1)).with_cancel(cancel);
        let mut matrix = ReportMatrix::new(4);

        let err = engine.run_epochs(&network, &mut matrix, 3, None).unwrap_err();
        assert!(matches!(err, TrustbedError::Cancelled(_)));
        assert_eq!(matrix.populated(), 0);
    }

    #[test]
    fn test_zero_time_budget_truncates() {
        let network = uniform_network(4);
        let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(1))
            .with_time_budget(Duration::ZERO);
        let mut matrix = ReportMatrix::new(4);

        let summary = engine.run_epochs(&network, &mut matrix, 3, None).unwrap();
        assert!(summary.truncated);
        assert_eq!(summary.epochs_completed, 0);
    }
}
