//! Per-reporter report corpora
//!
//! Training and held-out partitions are looked up by reporter id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use trustbed_common::ReportRecord;

use crate::matrix::ReportMatrix;

/// Reports grouped by reporter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportCorpus {
    by_reporter: BTreeMap<usize, Vec<ReportRecord>>,
}

impl ReportCorpus {
    pub fn from_records(records: impl IntoIterator<Item = ReportRecord>) -> Self {
        let mut by_reporter: BTreeMap<usize, Vec<ReportRecord>> = BTreeMap::new();
        for record in records {
            by_reporter.entry(record.reporter).or_default().push(record);
        }
        Self { by_reporter }
    }

    /// Latest-snapshot corpus from a matrix
    pub fn from_matrix(matrix: &ReportMatrix) -> Self {
        Self::from_records(matrix.records())
    }

    /// Reporter ids present, ascending
    pub fn reporters(&self) -> Vec<usize> {
        self.by_reporter.keys().copied().collect()
    }

    /// One reporter's records (empty if it never reported)
    pub fn partition(&self, reporter: usize) -> &[ReportRecord] {
        self.by_reporter
            .get(&reporter)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_reporter.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_reporter.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportRecord> {
        self.by_reporter.values().flatten()
    }
}
