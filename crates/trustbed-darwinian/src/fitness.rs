//! Fitness: held-out prediction accuracy

use trustbed_common::Note;

use crate::classifier::bundle::ClassifierBundle;
use crate::classifier::{Classifier, Features};

/// Fraction of samples whose note the classifier predicts exactly
///
/// An empty sample set scores 0.
pub fn accuracy<C: Classifier + ?Sized>(classifier: &C, samples: &[(Features, Note)]) -> f64 {
    fraction_correct(samples, |features| Some(classifier.predict(features)))
}

/// Accuracy of a whole bundle, routing each sample to its reporter's model
///
/// Samples of reporters without a model count as misses.
pub fn bundle_accuracy<C: Classifier>(
    bundle: &ClassifierBundle<C>,
    samples: &[(Features, Note)],
) -> f64 {
    fraction_correct(samples, |features| bundle.predict_features(features))
}

fn fraction_correct<P>(samples: &[(Features, Note)], predict: P) -> f64
where
    P: Fn(&Features) -> Option<Note>,
{
    if samples.is_empty() {
        return 0.0;
    }
    let correct = samples
        .iter()
        .filter(|(features, note)| predict(features) == Some(*note))
        .count();
    correct as f64 / samples.len() as f64
}
