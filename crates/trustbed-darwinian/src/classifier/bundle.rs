//! Classifier bundle: one model per reporter, or one model shared by all

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, instrument};
use trustbed_common::{Note, Result, TrustbedError};
use trustbed_ledger::{ModelBlobRef, ReportCorpus};

use super::{samples, Classifier, ClassifierFactory, Features, Hyperparameters};
use crate::store::models::{parse_reporter_key, reporter_key, ModelStore, SHARED_KEY};

/// Trained classifiers consulted by the recommendation layer
#[derive(Debug, Clone)]
pub enum ClassifierBundle<C> {
    /// Keyed by the reporter (client) whose view the model learned
    PerReporter(BTreeMap<usize, C>),
    /// A single model over every reporter's reports
    Shared(C),
}

impl<C: Classifier> ClassifierBundle<C> {
    /// Fit the shared model on every report of the corpus
    #[instrument(skip(factory, corpus), fields(samples = corpus.len()))]
    pub fn fit_shared<F>(
        factory: &F,
        hyperparameters: Hyperparameters,
        corpus: &ReportCorpus,
    ) -> Result<Self>
    where
        F: ClassifierFactory<Model = C>,
    {
        let records: Vec<_> = corpus.iter().copied().collect();
        let mut model = factory.build(hyperparameters);
        model.fit(&samples(&records)).map_err(|e| e.for_shared())?;
        info!("Fitted shared classifier");
        Ok(Self::Shared(model))
    }

    /// Note `client` would expect from `subject` for a demand
    ///
    /// `None` when no model covers the client.
    pub fn predict(
        &self,
        client: usize,
        subject: usize,
        service_target: u32,
        capability_target: u32,
    ) -> Option<Note> {
        self.predict_features(&Features::new(
            client,
            subject,
            service_target,
            capability_target,
        ))
    }

    /// Like [`predict`](Self::predict), with the reporter as the client
    pub fn predict_features(&self, features: &Features) -> Option<Note> {
        match self {
            ClassifierBundle::PerReporter(models) => models
                .get(&features.reporter)
                .map(|model| model.predict(features)),
            ClassifierBundle::Shared(model) => Some(model.predict(features)),
        }
    }

    pub fn covers(&self, client: usize) -> bool {
        match self {
            ClassifierBundle::PerReporter(models) => models.contains_key(&client),
            ClassifierBundle::Shared(_) => true,
        }
    }

    /// Number of trained models
    pub fn len(&self) -> usize {
        match self {
            ClassifierBundle::PerReporter(models) => models.len(),
            ClassifierBundle::Shared(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Serialize> ClassifierBundle<C> {
    /// Store every model as a blob
    pub fn save(&self, store: &ModelStore) -> Result<Vec<ModelBlobRef>> {
        match self {
            ClassifierBundle::PerReporter(models) => models
                .iter()
                .map(|(reporter, model)| store.save(&reporter_key(*reporter), model))
                .collect(),
            ClassifierBundle::Shared(model) => Ok(vec![store.save(SHARED_KEY, model)?]),
        }
    }
}

impl<C: DeserializeOwned> ClassifierBundle<C> {
    /// Rebuild a bundle from blob references
    ///
    /// A `shared` blob yields a shared bundle; otherwise every `reporter-<id>`
    /// blob is loaded and other keys are rejected.
    pub fn load(store: &ModelStore, blobs: &[ModelBlobRef]) -> Result<Self> {
        if let Some(blob) = blobs.iter().find(|b| b.key == SHARED_KEY) {
            return Ok(Self::Shared(store.load(blob)?));
        }

        let mut models = BTreeMap::new();
        for blob in blobs {
            let reporter = parse_reporter_key(&blob.key).ok_or_else(|| {
                TrustbedError::Storage(format!("unrecognized model key {:?}", blob.key))
            })?;
            models.insert(reporter, store.load(blob)?);
        }
        Ok(Self::PerReporter(models))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::kernel::{KernelVoteClassifier, KernelVoteFactory};
    use crate::classifier::MockClassifier;
    use trustbed_common::{Report, ReportRecord, TrainingError};

    fn hp() -> Hyperparameters {
        Hyperparameters {
            regularization: 5.0,
            kernel_width: 0.1,
        }
    }

    #[test]
    fn test_per_reporter_prediction() {
        let mut model = MockClassifier::new();
        model
            .expect_predict()
            .withf(|f| f.reporter == 2 && f.subject == 5)
            .returning(|_| Note::Positive);

        let bundle = ClassifierBundle::PerReporter(BTreeMap::from([(2, model)]));
        assert_eq!(bundle.predict(2, 5, 10, 10), Some(Note::Positive));
        assert_eq!(bundle.predict(3, 5, 10, 10), None);
        assert!(bundle.covers(2));
        assert!(!bundle.covers(3));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_shared_fit_failure() {
        let corpus = ReportCorpus::from_records(vec![ReportRecord::new(
            0,
            1,
            Report::new(1, 1, Note::Neutral, 1),
        )]);
        let err = ClassifierBundle::fit_shared(&KernelVoteFactory::default(), hp(), &corpus)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustbedError::Training(TrainingError::SharedFitFailed { .. })
        ));
    }

    #[test]
    fn test_shared_bundle_covers_everyone() {
        let corpus = ReportCorpus::from_records(vec![
            ReportRecord::new(0, 1, Report::new(10, 10, Note::Positive, 1)),
            ReportRecord::new(1, 0, Report::new(90, 90, Note::Negative, 1)),
        ]);
        let bundle =
            ClassifierBundle::fit_shared(&KernelVoteFactory::default(), hp(), &corpus).unwrap();
        assert!(bundle.covers(17));
        assert!(bundle.predict(17, 0, 50, 50).is_some());
    }

    #[test]
    fn test_save_and_load_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::open(dir.path()).unwrap();

        let mut model = KernelVoteClassifier::new(hp());
        model
            .fit(&[
                (Features::new(3, 0, 10, 10), Note::Positive),
                (Features::new(3, 1, 90, 90), Note::Negative),
            ])
            .unwrap();
        let bundle = ClassifierBundle::PerReporter(BTreeMap::from([(3, model)]));

        let blobs = bundle.save(&store).unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].key, "reporter-3");

        let loaded: ClassifierBundle<KernelVoteClassifier> =
            ClassifierBundle::load(&store, &blobs).unwrap();
        assert_eq!(loaded.predict(3, 0, 10, 10), bundle.predict(3, 0, 10, 10));
        assert!(loaded.covers(3));
    }
}
