//! Report matrix - the latest report per (reporter, subject) pair
//!
//! Cells are `Option<Report>`: `None` means "not yet reported". The diagonal
//! is never written since nodes do not report on themselves.

use serde::{Deserialize, Serialize};
use trustbed_common::{DataError, Report, ReportRecord};

/// N×N matrix of optional reports, row = reporter, column = subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMatrix {
    size: usize,
    cells: Vec<Option<Report>>,
}

impl ReportMatrix {
    /// Empty matrix for `size` nodes
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.size, self.size)
    }

    pub fn get(&self, reporter: usize, subject: usize) -> Option<&Report> {
        if reporter >= self.size || subject >= self.size {
            return None;
        }
        self.cells[self.index(reporter, subject)].as_ref()
    }

    /// Store a report, returning the one it replaced
    pub fn set(
        &mut self,
        reporter: usize,
        subject: usize,
        report: Report,
    ) -> Result<Option<Report>, DataError> {
        for id in [reporter, subject] {
            if id >= self.size {
                return Err(DataError::NodeOutOfRange {
                    id,
                    size: self.size,
                });
            }
        }
        if reporter == subject {
            return Err(DataError::SelfReport(reporter));
        }

        let idx = self.index(reporter, subject);
        Ok(self.cells[idx].replace(report))
    }

    /// Store a logged record
    pub fn apply(&mut self, record: &ReportRecord) -> Result<Option<Report>, DataError> {
        self.set(record.reporter, record.subject, record.report)
    }

    /// All reports authored by `reporter`
    pub fn reports_by(&self, reporter: usize) -> Vec<ReportRecord> {
        if reporter >= self.size {
            return Vec::new();
        }
        (0..self.size)
            .filter_map(|subject| {
                self.get(reporter, subject)
                    .map(|report| ReportRecord::new(reporter, subject, *report))
            })
            .collect()
    }

    /// Every stored report in row-major order
    pub fn records(&self) -> impl Iterator<Item = ReportRecord> + '_ {
        self.cells.iter().enumerate().filter_map(move |(idx, cell)| {
            cell.map(|report| ReportRecord::new(idx / self.size, idx % self.size, report))
        })
    }

    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Every off-diagonal cell holds a report and the diagonal is empty
    pub fn is_complete(&self) -> bool {
        (0..self.size).all(|r| {
            (0..self.size).all(|s| (r == s) == self.get(r, s).is_none())
        })
    }

    fn index(&self, reporter: usize, subject: usize) -> usize {
        reporter * self.size + subject
    }
}
