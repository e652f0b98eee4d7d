//! Persistence for search results and trained models

pub mod hyperlog;
pub mod models;
