//! # Trustbed
//!
//! End-to-end runner for the reputation testbed:
//!
//! ```text
//! population ──▶ bootstrap (train/test logs) ──▶ hyperparameter sweep
//!                                                     │
//!         outcome tally ◀── transaction simulator ◀───┘
//! ```

pub mod config;
pub mod pipeline;

pub use config::{ClassifierMode, PathSettings, SharedModelSettings, TrustbedConfig};
pub use pipeline::{run, PipelineReport};
