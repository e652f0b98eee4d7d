//! End-to-end run: generate → search → simulate
//!
//! Training always reads the full report history back from the logs; the
//! persisted state keeps only the latest report per pair. Reusing logs also
//! reuses the persisted network, so the logs and the simulated population
//! always come from the same run.

use std::fs;
use std::path::PathBuf;

use tracing::{info, instrument, warn};
use trustbed_broker::{OutcomeTally, TransactionSimulator};
use trustbed_common::{CancelToken, ReportRecord, Result, SeedSource, TrainingError, TrustbedError};
use trustbed_darwinian::classifier::samples;
use trustbed_darwinian::{
    bundle_accuracy, write_hyperparameter_log, ClassifierBundle, HillClimber, KernelVoteFactory,
    ModelStore,
};
use trustbed_ledger::{
    read_report_log, BootstrapEngine, BootstrapSummary, CsvReportLog, ModelBlobRef, Population,
    PopulationBuilder, ReportCorpus, ReportMatrix, SimulationState,
};
use uuid::Uuid;

use crate::config::{ClassifierMode, TrustbedConfig};

/// Summary of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub run_id: Uuid,
    /// `None` when existing logs were reused
    pub bootstrap: Option<BootstrapSummary>,
    pub train_reports: usize,
    pub test_reports: usize,
    /// Reporters with a tuned model
    pub champions: usize,
    /// Reporters whose training was abandoned
    pub failures: Vec<TrainingError>,
    /// Fraction of held-out reports the bundle predicts exactly
    pub held_out_accuracy: f64,
    pub models: Vec<ModelBlobRef>,
    pub tally: OutcomeTally,
    pub state_path: PathBuf,
}

impl PipelineReport {
    /// `(bad%, ok%, good%)` of the simulated transactions
    pub fn percentages(&self) -> (f64, f64, f64) {
        self.tally.percentages()
    }
}

/// Run the whole testbed once
#[instrument(skip_all, fields(seed = config.seed, nodes = config.population.node_count))]
pub fn run(config: &TrustbedConfig, cancel: &CancelToken) -> Result<PipelineReport> {
    config.validate()?;
    let paths = &config.paths;
    fs::create_dir_all(&paths.data_dir)
        .map_err(|e| TrustbedError::Storage(format!("{}: {}", paths.data_dir.display(), e)))?;

    let seeds = SeedSource::new(config.seed);
    let generated = if config.generate {
        let population = PopulationBuilder::new(config.population.clone())
            .build(&mut seeds.stream("population", 0))?;
        let engine = BootstrapEngine::from_config(&config.bootstrap, seeds.derive("bootstrap", 0))
            .with_cancel(cancel.clone());
        let mut train_log = CsvReportLog::create(paths.train_log())?;
        let mut test_log = CsvReportLog::create(paths.test_log())?;
        let corpora = engine.generate_corpora(
            &population.network,
            config.bootstrap.epochs,
            &mut train_log,
            &mut test_log,
        )?;
        Some((population, corpora))
    } else {
        info!("Reusing existing report logs");
        None
    };

    let train_records = read_report_log(&paths.train_log())?;
    let test_records = read_report_log(&paths.test_log())?;
    let (population, bootstrap, matrix) = match generated {
        Some((population, corpora)) => (population, Some(corpora.summary), corpora.train),
        None => {
            let population = persisted_population(config)?;
            let matrix = latest_matrix(population.network.len(), &train_records)?;
            (population, None, matrix)
        }
    };
    let train = ReportCorpus::from_records(train_records.iter().copied());
    let test = ReportCorpus::from_records(test_records.iter().copied());

    let factory = KernelVoteFactory::new(config.max_support);
    let (bundle, champions, failures) = match config.classifier {
        ClassifierMode::PerReporter => {
            let climber = HillClimber::new(config.search.clone(), factory)?.with_cancel(cancel.clone());
            let (sweep, bundle) = climber.evolve_all(&train, &test, &seeds.derive("search", 0))?;
            write_hyperparameter_log(&paths.hyperparameter_log(), &sweep.records())?;
            (bundle, sweep.champions.len(), sweep.failures)
        }
        ClassifierMode::Shared => {
            match ClassifierBundle::fit_shared(&factory, config.shared.hyperparameters(), &train) {
                Ok(bundle) => (bundle, 1, Vec::new()),
                Err(TrustbedError::Training(err)) => {
                    warn!(error = %err, "Shared classifier could not be trained");
                    (ClassifierBundle::PerReporter(Default::default()), 0, vec![err])
                }
                Err(err) => return Err(err),
            }
        }
    };
    let held_out_accuracy = bundle_accuracy(&bundle, &samples(&test_records));
    info!(
        models = bundle.len(),
        failures = failures.len(),
        held_out_accuracy,
        "Classifiers trained"
    );

    let store = ModelStore::open(paths.model_dir())?;
    let models = bundle.save(&store)?;

    let mut state = SimulationState::new(
        config.seed,
        config.population.clone(),
        config.bootstrap.clone(),
        population,
        matrix,
    );
    for blob in &models {
        state.register_model(blob.clone());
    }
    let state_path = paths.state_file();
    state.save(&state_path)?;

    let simulator =
        TransactionSimulator::new(config.simulation.clone())?.with_cancel(cancel.clone());
    let tally = simulator.simulate(&state.network, &bundle, &seeds.derive("simulation", 0))?;

    let (bad, ok, good) = tally.percentages();
    info!(
        run_id = %state.run_id,
        bad_pct = bad,
        ok_pct = ok,
        good_pct = good,
        "Run complete"
    );

    Ok(PipelineReport {
        run_id: state.run_id,
        bootstrap,
        train_reports: train_records.len(),
        test_reports: test_records.len(),
        champions,
        failures,
        held_out_accuracy,
        models,
        tally,
        state_path,
    })
}

/// Network and roster of the run that wrote the logs being reused
///
/// The saved state must match the configured seed and population, otherwise
/// the classifiers would be scored against a different network than the one
/// they learned from.
fn persisted_population(config: &TrustbedConfig) -> Result<Population> {
    let path = config.paths.state_file();
    if !path.exists() {
        return Err(TrustbedError::Config(format!(
            "{}: no saved state for the existing logs; rerun with generate enabled",
            path.display()
        )));
    }

    let state = SimulationState::load(&path)?;
    if state.seed != config.seed {
        return Err(TrustbedError::Config(format!(
            "{}: logs were generated with seed {}, configured seed is {}",
            path.display(),
            state.seed,
            config.seed
        )));
    }
    if state.population != config.population {
        return Err(TrustbedError::Config(format!(
            "{}: logs were generated with a different population configuration",
            path.display()
        )));
    }
    info!(run_id = %state.run_id, nodes = state.network.len(), "Loaded persisted network");
    Ok(Population {
        network: state.network,
        roster: state.roster,
    })
}

/// Latest report per pair, replaying the log in order
fn latest_matrix(size: usize, records: &[ReportRecord]) -> Result<ReportMatrix> {
    let mut matrix = ReportMatrix::new(size);
    for record in records {
        matrix.apply(record)?;
    }
    Ok(matrix)
}
