//! # Ledger
//!
//! Population building and report generation for the Trustbed testbed.
//!
//! ## Components
//!
//! - **Population**: builds a [`Network`] of nodes from configured proportions
//! - **Matrix**: latest report per (reporter, subject) pair
//! - **Bootstrap**: all-pairs synthetic transactions across epochs
//! - **Log**: append-only CSV report log and per-reporter corpora
//! - **State**: versioned snapshot of a simulation run
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                         Ledger                            │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐   ┌──────────────┐   ┌───────────────┐  │
//! │  │  Population  │──▶│  Bootstrap   │──▶│  ReportMatrix │  │
//! │  │   Builder    │   │   Engine     │   │ (latest only) │  │
//! │  └──────────────┘   └──────┬───────┘   └───────────────┘  │
//! │                            ▼                              │
//! │                    ┌──────────────┐                       │
//! │                    │  Report Log  │  (every epoch)        │
//! │                    └──────────────┘                       │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod bootstrap;
pub mod log;
pub mod matrix;
pub mod population;
pub mod state;

pub use bootstrap::engine::{BootstrapEngine, BootstrapSummary, Corpora};
pub use log::corpus::ReportCorpus;
pub use log::csv::{read_report_log, CsvReportLog, ReportSink};
pub use matrix::ReportMatrix;
pub use population::builder::{conditioned_ids, Population, PopulationBuilder, Roster};
pub use population::network::Network;
pub use state::{ModelBlobRef, SimulationState};

use rand::Rng;
use serde::{Deserialize, Serialize};
use trustbed_common::{Result, TrustbedError, DEFAULT_CAPABILITY_MAX, DEFAULT_SERVICE_MAX};

/// Population configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Number of nodes in the network
    pub node_count: usize,
    /// Fraction of nodes with randomly reduced capacities
    pub constrained_fraction: f64,
    /// Fraction of malicious nodes; they rate every counterparty `-1`
    pub malicious_fraction: f64,
    /// Fraction of nodes that bad-mouth every counterparty
    pub dishonest_fraction: f64,
    /// Fraction of nodes whose honest reports are noisy
    pub poor_witness_fraction: f64,
    /// Service capacity ceiling
    pub service_max: u32,
    /// Resource capacity ceiling
    pub capability_max: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            node_count: 50,
            constrained_fraction: 0.5,
            malicious_fraction: 0.1,
            dishonest_fraction: 0.1,
            poor_witness_fraction: 0.2,
            service_max: DEFAULT_SERVICE_MAX,
            capability_max: DEFAULT_CAPABILITY_MAX,
        }
    }
}

impl PopulationConfig {
    /// A fully honest network with every node at the capacity ceilings
    pub fn uniform(node_count: usize) -> Self {
        Self {
            node_count,
            constrained_fraction: 0.0,
            malicious_fraction: 0.0,
            dishonest_fraction: 0.0,
            poor_witness_fraction: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_count < 2 {
            return Err(TrustbedError::Config(format!(
                "node_count must be at least 2, got {}",
                self.node_count
            )));
        }
        for (name, value) in [
            ("constrained_fraction", self.constrained_fraction),
            ("malicious_fraction", self.malicious_fraction),
            ("dishonest_fraction", self.dishonest_fraction),
            ("poor_witness_fraction", self.poor_witness_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrustbedError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.service_max == 0 || self.capability_max == 0 {
            return Err(TrustbedError::Config(
                "capacity ceilings must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Inclusive ranges that demanded service/capability targets are drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRanges {
    pub service_min: u32,
    pub service_max: u32,
    pub capability_min: u32,
    pub capability_max: u32,
}

impl Default for TargetRanges {
    fn default() -> Self {
        Self {
            service_min: 0,
            service_max: DEFAULT_SERVICE_MAX,
            capability_min: 0,
            capability_max: DEFAULT_CAPABILITY_MAX,
        }
    }
}

impl TargetRanges {
    pub fn validate(&self) -> Result<()> {
        if self.service_min > self.service_max || self.capability_min > self.capability_max {
            return Err(TrustbedError::Config(format!(
                "empty target range: service {}..={}, capability {}..={}",
                self.service_min, self.service_max, self.capability_min, self.capability_max
            )));
        }
        Ok(())
    }

    /// Draw a (service, capability) demand uniformly
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (u32, u32) {
        let service = rng.gen_range(self.service_min..=self.service_max);
        let capability = rng.gen_range(self.capability_min..=self.capability_max);
        (service, capability)
    }
}

/// Bootstrap configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Number of epochs to run
    pub epochs: u32,
    /// Demand ranges
    pub targets: TargetRanges,
    /// Wall-clock budget in seconds; unfinished epochs are skipped
    pub time_budget_secs: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            targets: TargetRanges::default(),
            time_budget_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_config_is_valid() {
        assert!(PopulationConfig::default().validate().is_ok());
        assert!(TargetRanges::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_bad_fraction() {
        let config = PopulationConfig {
            dishonest_fraction: 1.5,
            ..PopulationConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrustbedError::Config(_))));

        let config = PopulationConfig::uniform(1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_target_sampling_stays_in_range() {
        let ranges = TargetRanges {
            service_min: 10,
            service_max: 20,
            capability_min: 0,
            capability_max: 5,
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..500 {
            let (s, c) = ranges.sample(&mut rng);
            assert!((10..=20).contains(&s));
            assert!(c <= 5);
        }
    }
}
