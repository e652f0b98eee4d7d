//! Seedable random streams
//!
//! Every independent unit of work (a bootstrap row, a reporter's climb, a
//! simulation run) draws from its own stream derived from the master seed, so
//! results do not depend on how rayon schedules the work.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A master seed from which named streams are derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedSource {
    seed: u64,
}

impl SeedSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive a child source for a sub-domain of work
    pub fn derive(&self, domain: &str, unit: u64) -> SeedSource {
        let digest = Self::digest(self.seed, domain, unit);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        SeedSource::new(u64::from_le_bytes(bytes))
    }

    /// Random stream for one unit of work
    pub fn stream(&self, domain: &str, unit: u64) -> StdRng {
        StdRng::from_seed(Self::digest(self.seed, domain, unit))
    }

    fn digest(seed: u64, domain: &str, unit: u64) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&seed.to_le_bytes());
        hasher.update(&(domain.len() as u64).to_le_bytes());
        hasher.update(domain.as_bytes());
        hasher.update(&unit.to_le_bytes());
        *hasher.finalize().as_bytes()
    }
}
