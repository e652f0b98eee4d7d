//! # Trustbed Common
//!
//! Shared types and errors for the Trustbed reputation testbed.
//!
//! ## Core Types
//!
//! - [`Note`]: three-valued rating (-1, 0, 1)
//! - [`Node`]: simulated participant with capacities and a [`ReportingStrategy`]
//! - [`Report`]/[`ReportRecord`]: a rating for one demand, with or without its
//!   reporter and subject
//! - [`SeedSource`]: derivation of independent seedable random streams
//! - [`CancelToken`]: cooperative cancellation for long loops

pub mod cancel;
pub mod error;
pub mod seed;
pub mod types;

// Re-export commonly used types at crate root
pub use cancel::CancelToken;
pub use error::{DataError, Result, TrainingError, TrustbedError};
pub use seed::SeedSource;
pub use types::{
    node::{Node, ReportingStrategy},
    note::Note,
    report::{Report, ReportRecord},
};

/// Trustbed version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default service capacity ceiling
pub const DEFAULT_SERVICE_MAX: u32 = 100;

/// Default resource capacity ceiling
pub const DEFAULT_CAPABILITY_MAX: u32 = 100;

/// Default held-out accuracy at which a hill-climb stops early
pub const DEFAULT_TARGET_ACCURACY: f64 = 0.99;

/// Schema version of persisted simulation state
pub const STATE_SCHEMA_VERSION: u32 = 1;
