//! Population module
//!
//! Builds the simulated network from configured category fractions.

pub mod builder;
pub mod network;

pub use builder::{conditioned_ids, Population, PopulationBuilder, Roster};
pub use network::Network;
