//! Hyperparameter search
//!
//! [`hill_climb`] tunes one reporter; [`sweep`] runs every reporter of a
//! corpus in parallel and collects champions and per-reporter failures.

pub mod hill_climb;
pub mod sweep;
