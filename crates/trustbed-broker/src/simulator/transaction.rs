//! Closed-loop transaction simulator
//!
//! A random client with a random demand consults the recommendations for
//! that demand, picks a server (trusted first, then acceptable) and rates
//! the realized service with the ground-truth rating model. With no
//! candidate at all the transaction is a bad outcome.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use trustbed_common::{CancelToken, Note, Result, SeedSource, TrustbedError};
use trustbed_darwinian::{Classifier, ClassifierBundle};
use trustbed_ledger::Network;

use super::tally::OutcomeTally;
use crate::recommend::cache::RecommendationCache;
use crate::recommend::table::RecommendationTable;
use crate::SimulationConfig;

/// Stream domain of the simulator
pub const SIMULATION_DOMAIN: &str = "simulate";

/// One simulated transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub client: usize,
    /// `None` when no server was eligible
    pub server: Option<usize>,
    pub service_target: u32,
    pub capability_target: u32,
    pub outcome: Note,
}

pub struct TransactionSimulator {
    config: SimulationConfig,
    cancel: CancelToken,
}

impl TransactionSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancelToken::new(),
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate a single transaction
    pub fn simulate_one<C, R>(
        &self,
        network: &Network,
        bundle: &ClassifierBundle<C>,
        cache: &RecommendationCache,
        rng: &mut R,
    ) -> Result<Transaction>
    where
        C: Classifier + Sync,
        R: Rng + ?Sized,
    {
        if network.is_empty() {
            return Err(TrustbedError::Config(
                "cannot simulate transactions on an empty network".to_string(),
            ));
        }

        let (service_target, capability_target) = self.config.targets.sample(rng);
        let client = rng.gen_range(0..network.len());
        let table = cache.get_or_compute(service_target, capability_target, || {
            RecommendationTable::compute(bundle, service_target, capability_target, network.len())
        });

        let candidates = table.candidates(client);
        let pool = if candidates.trusted.is_empty() {
            &candidates.acceptable
        } else {
            &candidates.trusted
        };

        let (server, outcome) = if pool.is_empty() {
            (None, Note::Negative)
        } else {
            let server = pool[rng.gen_range(0..pool.len())];
            let outcome = network.node(client)?.rate(
                network.node(server)?,
                service_target,
                capability_target,
            );
            (Some(server), outcome)
        };

        Ok(Transaction {
            client,
            server,
            service_target,
            capability_target,
            outcome,
        })
    }

    /// Simulate every configured epoch and tally the outcomes
    pub fn simulate<C>(
        &self,
        network: &Network,
        bundle: &ClassifierBundle<C>,
        seeds: &SeedSource,
    ) -> Result<OutcomeTally>
    where
        C: Classifier + Sync,
    {
        self.simulate_epochs(network, bundle, seeds, self.config.epochs)
    }

    /// Simulate `epochs` epochs of `transactions_per_epoch` transactions each
    #[instrument(skip(self, network, bundle, seeds), fields(nodes = network.len()))]
    pub fn simulate_epochs<C>(
        &self,
        network: &Network,
        bundle: &ClassifierBundle<C>,
        seeds: &SeedSource,
        epochs: u32,
    ) -> Result<OutcomeTally>
    where
        C: Classifier + Sync,
    {
        let cache = RecommendationCache::new();
        let mut rng = seeds.stream(SIMULATION_DOMAIN, 0);
        let mut tally = OutcomeTally::default();

        for epoch in 1..=epochs {
            for _ in 0..self.config.transactions_per_epoch {
                self.cancel.check("simulation")?;
                let transaction = self.simulate_one(network, bundle, &cache, &mut rng)?;
                tally.record(transaction.outcome);
            }
            debug!(epoch, transactions = tally.total(), "Simulated epoch");
        }

        let (bad, ok, good) = tally.percentages();
        let stats = cache.stats();
        info!(
            transactions = tally.total(),
            bad_pct = bad,
            ok_pct = ok,
            good_pct = good,
            cached_demands = stats.entries,
            cache_hits = stats.hits,
            "Simulation finished"
        );
        Ok(tally)
    }
}
