//! Recommendations: predicted notes of every server for every client

pub mod cache;
pub mod table;
