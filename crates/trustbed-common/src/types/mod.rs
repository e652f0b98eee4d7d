//! Core data types for Trustbed

pub mod node;
pub mod note;
pub mod report;
