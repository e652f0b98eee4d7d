//! End-to-end tests across ledger, darwinian and broker

use std::collections::BTreeMap;

use trustbed_broker::{SimulationConfig, TransactionSimulator};
use trustbed_cli::{pipeline, ClassifierMode, PathSettings, TrustbedConfig};
use trustbed_common::{
    CancelToken, DataError, Node, Note, ReportRecord, SeedSource, TrustbedError,
};
use trustbed_darwinian::{
    read_hyperparameter_log, ClassifierBundle, KernelVoteClassifier, ModelStore, SearchConfig,
};
use trustbed_ledger::{
    BootstrapConfig, BootstrapEngine, Network, PopulationBuilder, PopulationConfig, ReportMatrix,
    SimulationState, TargetRanges,
};

fn small_config(data_dir: &std::path::Path) -> TrustbedConfig {
    TrustbedConfig {
        seed: 2024,
        population: PopulationConfig {
            node_count: 6,
            ..PopulationConfig::default()
        },
        bootstrap: BootstrapConfig {
            epochs: 3,
            ..BootstrapConfig::default()
        },
        search: SearchConfig {
            max_iterations: 2,
            ..SearchConfig::default()
        },
        simulation: SimulationConfig {
            epochs: 10,
            ..SimulationConfig::default()
        },
        paths: PathSettings::with_data_dir(data_dir),
        ..TrustbedConfig::default()
    }
}

#[test]
fn test_honest_ceiling_nodes_rate_everyone_positive() {
    let population = PopulationBuilder::new(PopulationConfig::uniform(4))
        .build(&mut SeedSource::new(1).stream("population", 0))
        .unwrap();
    let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(1));
    let mut matrix = ReportMatrix::new(4);

    engine
        .run_epochs(&population.network, &mut matrix, 1, None)
        .unwrap();

    assert!(matrix.is_complete());
    for reporter in 0..4 {
        for subject in 0..4 {
            match matrix.get(reporter, subject) {
                None => assert_eq!(reporter, subject),
                Some(report) => assert_eq!(report.note, Note::Positive),
            }
        }
    }
}

#[test]
fn test_dishonest_reporter_always_negative() {
    let network = Network::from_nodes(vec![
        Node::new(100, 100),
        Node::new(100, 100),
        Node::bad_mouther(100, 100),
        Node::new(100, 100),
    ]);
    let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(5));
    let mut matrix = ReportMatrix::new(4);
    let mut log: Vec<ReportRecord> = Vec::new();

    engine
        .run_epochs(&network, &mut matrix, 3, Some(&mut log))
        .unwrap();

    let by_liar: Vec<_> = log.iter().filter(|r| r.reporter == 2).collect();
    assert_eq!(by_liar.len(), 9);
    assert!(by_liar.iter().all(|r| r.report.note == Note::Negative));
    assert!(matrix
        .reports_by(2)
        .iter()
        .all(|r| r.report.note == Note::Negative));
}

#[test]
fn test_malicious_population_nodes_report_negative() {
    let config = PopulationConfig {
        malicious_fraction: 0.5,
        ..PopulationConfig::uniform(6)
    };
    let population = PopulationBuilder::new(config)
        .build(&mut SeedSource::new(4).stream("population", 0))
        .unwrap();
    assert_eq!(population.roster.malicious.len(), 3);

    let engine = BootstrapEngine::new(TargetRanges::default(), SeedSource::new(4));
    let mut matrix = ReportMatrix::new(6);
    let mut log: Vec<ReportRecord> = Vec::new();
    engine
        .run_epochs(&population.network, &mut matrix, 2, Some(&mut log))
        .unwrap();

    for record in &log {
        let expected_negative = population.roster.malicious.contains(&record.reporter);
        assert_eq!(record.report.note == Note::Negative, expected_negative);
    }
}

#[test]
fn test_simulation_without_eligible_servers_is_all_bad() {
    let network = Network::from_nodes(vec![Node::new(100, 100); 4]);
    let bundle: ClassifierBundle<KernelVoteClassifier> =
        ClassifierBundle::PerReporter(BTreeMap::new());
    let simulator = TransactionSimulator::new(SimulationConfig {
        epochs: 25,
        ..SimulationConfig::default()
    })
    .unwrap();

    let tally = simulator
        .simulate(&network, &bundle, &SeedSource::new(3))
        .unwrap();
    assert_eq!(tally.percentages(), (100.0, 0.0, 0.0));
}

#[test]
fn test_full_pipeline_per_reporter() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());

    let report = pipeline::run(&config, &CancelToken::new()).unwrap();

    // 6 nodes × 5 subjects × 3 epochs per corpus
    assert_eq!(report.train_reports, 90);
    assert_eq!(report.test_reports, 90);
    assert_eq!(report.champions + report.failures.len(), 6);
    assert_eq!(report.models.len(), report.champions);
    assert_eq!(report.tally.total(), 10);
    assert!((0.0..=1.0).contains(&report.held_out_accuracy));

    let hyperparameters = read_hyperparameter_log(&config.paths.hyperparameter_log()).unwrap();
    assert_eq!(hyperparameters.len(), report.champions);
    assert!(hyperparameters
        .iter()
        .all(|h| h.regularization > 0.0 && h.kernel_width > 0.0));

    let state = SimulationState::load(&report.state_path).unwrap();
    assert_eq!(state.run_id, report.run_id);
    assert_eq!(state.network.len(), 6);
    assert!(state.matrix.is_complete());
    assert_eq!(state.models.len(), report.models.len());

    let store = ModelStore::open(config.paths.model_dir()).unwrap();
    let bundle: ClassifierBundle<KernelVoteClassifier> =
        ClassifierBundle::load(&store, &state.models).unwrap();
    assert_eq!(bundle.len(), report.champions);
}

#[test]
fn test_pipeline_is_reproducible() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let a = pipeline::run(&small_config(first.path()), &CancelToken::new()).unwrap();
    let b = pipeline::run(&small_config(second.path()), &CancelToken::new()).unwrap();

    assert_eq!(a.tally, b.tally);
    assert_eq!(a.failures, b.failures);
    assert_eq!(
        std::fs::read_to_string(first.path().join("reports-train.csv")).unwrap(),
        std::fs::read_to_string(second.path().join("reports-train.csv")).unwrap()
    );
}

#[test]
fn test_shared_classifier_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrustbedConfig {
        classifier: ClassifierMode::Shared,
        ..small_config(dir.path())
    };

    let report = pipeline::run(&config, &CancelToken::new()).unwrap();
    assert_eq!(report.models.len(), 1);
    assert_eq!(report.models[0].key, "shared");
    assert_eq!(report.tally.total(), 10);
}

#[test]
fn test_reuse_logs_without_generation() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    let generated = pipeline::run(&config, &CancelToken::new()).unwrap();

    let reuse = TrustbedConfig {
        generate: false,
        ..config
    };
    let reused = pipeline::run(&reuse, &CancelToken::new()).unwrap();

    assert!(reused.bootstrap.is_none());
    assert_eq!(reused.train_reports, generated.train_reports);
    assert_eq!(reused.tally, generated.tally);
}

#[test]
fn test_reuse_without_logs_names_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = TrustbedConfig {
        generate: false,
        ..small_config(dir.path())
    };

    match pipeline::run(&config, &CancelToken::new()) {
        Err(TrustbedError::Data(DataError::Unavailable { path, .. })) => {
            assert!(path.ends_with("reports-train.csv"))
        }
        other => panic!("expected missing log error, got {:?}", other.map(|r| r.run_id)),
    }
}

#[test]
fn test_reuse_with_different_seed_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    pipeline::run(&config, &CancelToken::new()).unwrap();

    let reuse = TrustbedConfig {
        seed: config.seed + 1,
        generate: false,
        ..config
    };
    assert!(matches!(
        pipeline::run(&reuse, &CancelToken::new()),
        Err(TrustbedError::Config(_))
    ));
}

#[test]
fn test_reuse_without_saved_state_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    pipeline::run(&config, &CancelToken::new()).unwrap();
    std::fs::remove_file(config.paths.state_file()).unwrap();

    let reuse = TrustbedConfig {
        generate: false,
        ..config
    };
    assert!(matches!(
        pipeline::run(&reuse, &CancelToken::new()),
        Err(TrustbedError::Config(_))
    ));
}

#[test]
fn test_reuse_simulates_persisted_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config(dir.path());
    pipeline::run(&config, &CancelToken::new()).unwrap();
    let generated = SimulationState::load(&config.paths.state_file()).unwrap();

    let reuse = TrustbedConfig {
        generate: false,
        ..config
    };
    let report = pipeline::run(&reuse, &CancelToken::new()).unwrap();
    let reused = SimulationState::load(&report.state_path).unwrap();
    assert_eq!(reused.network, generated.network);
    assert_eq!(reused.roster, generated.roster);
}

#[test]
fn test_cancelled_run() {
    let dir = tempfile::tempdir().unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = pipeline::run(&small_config(dir.path()), &cancel);
    assert!(matches!(result, Err(TrustbedError::Cancelled(_))));
}
