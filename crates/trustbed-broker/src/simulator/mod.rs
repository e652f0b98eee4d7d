//! Transaction simulation and outcome tallies

pub mod tally;
pub mod transaction;
