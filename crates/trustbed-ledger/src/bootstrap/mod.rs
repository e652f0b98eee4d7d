//! Bootstrap module
//!
//! Generates the synthetic report corpus by running all-pairs transactions
//! over a network for a number of epochs.

pub mod engine;

pub use engine::{BootstrapEngine, BootstrapSummary, Corpora};
