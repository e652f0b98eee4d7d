//! Population builder
//!
//! Each category (constrained, malicious server, dishonest reporter, poor
//! witness) draws its members from a fresh pool of ids, so categories are
//! sampled independently and may overlap.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use trustbed_common::{Node, ReportingStrategy, Result};

use super::network::Network;
use crate::PopulationConfig;

/// Draw `floor(n * fraction)` unique ids from `[0, n)`
///
/// Ids are removed from the pool as they are drawn, so the result never
/// repeats an id.
pub fn conditioned_ids<R: Rng + ?Sized>(n: usize, fraction: f64, rng: &mut R) -> Vec<usize> {
    let count = ((n as f64 * fraction).floor() as usize).min(n);
    let mut pool: Vec<usize> = (0..n).collect();

    (0..count)
        .map(|_| {
            let idx = rng.gen_range(0..pool.len());
            pool.swap_remove(idx)
        })
        .collect()
}

/// Ground-truth category membership of a built network
///
/// A real trust layer would never see this; it is kept for labeling and
/// analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub constrained: Vec<usize>,
    pub malicious: Vec<usize>,
    pub dishonest: Vec<usize>,
    pub poor_witnesses: Vec<usize>,
}

/// A network together with its roster
#[derive(Debug, Clone)]
pub struct Population {
    pub network: Network,
    pub roster: Roster,
}

/// Builds networks from a [`PopulationConfig`]
pub struct PopulationBuilder {
    config: PopulationConfig,
}

impl PopulationBuilder {
    pub fn new(config: PopulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    #[instrument(skip(self, rng), fields(nodes = self.config.node_count))]
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Population> {
        self.config.validate()?;
        let n = self.config.node_count;

        let roster = Roster {
            constrained: conditioned_ids(n, self.config.constrained_fraction, rng),
            malicious: conditioned_ids(n, self.config.malicious_fraction, rng),
            dishonest: conditioned_ids(n, self.config.dishonest_fraction, rng),
            poor_witnesses: conditioned_ids(n, self.config.poor_witness_fraction, rng),
        };

        let constrained: HashSet<usize> = roster.constrained.iter().copied().collect();
        let malicious: HashSet<usize> = roster.malicious.iter().copied().collect();
        let dishonest: HashSet<usize> = roster.dishonest.iter().copied().collect();
        let poor_witnesses: HashSet<usize> = roster.poor_witnesses.iter().copied().collect();

        let nodes = (0..n)
            .map(|id| {
                let (service, resource) = if constrained.contains(&id) {
                    (
                        rng.gen_range(0..self.config.service_max),
                        rng.gen_range(0..self.config.capability_max),
                    )
                } else {
                    (self.config.service_max, self.config.capability_max)
                };

                let strategy = if dishonest.contains(&id) {
                    ReportingStrategy::AlwaysNegative
                } else {
                    ReportingStrategy::Honest
                };

                let note_accuracy = if poor_witnesses.contains(&id) {
                    rng.gen::<f64>()
                } else {
                    1.0
                };

                Node::new(service, resource)
                    .with_strategy(strategy)
                    .with_malicious(malicious.contains(&id))
                    .with_note_accuracy(note_accuracy)
            })
            .collect();

        debug!(
            constrained = roster.constrained.len(),
            malicious = roster.malicious.len(),
            dishonest = roster.dishonest.len(),
            poor_witnesses = roster.poor_witnesses.len(),
            "Built population"
        );

        Ok(Population {
            network: Network::from_nodes(nodes),
            roster,
        })
    }
}
