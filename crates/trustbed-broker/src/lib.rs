//! # Broker
//!
//! Server selection driven by trained classifiers, and the closed-loop
//! transaction simulator that scores it.
//!
//! ## Transaction
//!
//! ```text
//! demand (s, c), client  ──▶  recommendations[s, c][client]
//!                                   │
//!            trusted (1) ◀──────────┴──────────▶ acceptable (0)
//!                 │  pick uniformly, trusted first  │
//!                 └──────────────┬──────────────────┘
//!                                ▼
//!             client.rate(server, s, c)   or   -1 with no server
//! ```

pub mod recommend;
pub mod simulator;

pub use recommend::cache::{CacheStats, RecommendationCache};
pub use recommend::table::{Candidates, RecommendationTable};
pub use simulator::tally::OutcomeTally;
pub use simulator::transaction::{Transaction, TransactionSimulator};

use serde::{Deserialize, Serialize};
use trustbed_common::{Result, TrustbedError};
use trustbed_ledger::TargetRanges;

/// Transaction simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of simulated epochs
    pub epochs: u32,
    /// Transactions per epoch
    pub transactions_per_epoch: u32,
    /// Demand ranges
    pub targets: TargetRanges,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            transactions_per_epoch: 1,
            targets: TargetRanges::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transactions_per_epoch == 0 {
            return Err(TrustbedError::Config(
                "transactions_per_epoch must be positive".to_string(),
            ));
        }
        self.targets.validate()
    }

    pub fn total_transactions(&self) -> u64 {
        u64::from(self.epochs) * u64::from(self.transactions_per_epoch)
    }
}
