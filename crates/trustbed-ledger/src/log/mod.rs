//! Report log module
//!
//! The CSV log keeps every epoch's reports, while the in-memory matrix only
//! keeps the latest per pair.

pub mod corpus;
pub mod csv;

pub use corpus::ReportCorpus;
pub use csv::{read_report_log, CsvReportLog, ReportSink};
