//! Outcome tally

use serde::{Deserialize, Serialize};
use trustbed_common::Note;

/// Counts of realized transaction outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub bad: u64,
    pub ok: u64,
    pub good: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: Note) {
        match outcome {
            Note::Negative => self.bad += 1,
            Note::Neutral => self.ok += 1,
            Note::Positive => self.good += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.bad + self.ok + self.good
    }

    /// `(bad%, ok%, good%)`; all zero when nothing was recorded
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.total();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let pct = |count: u64| 100.0 * count as f64 / total as f64;
        (pct(self.bad), pct(self.ok), pct(self.good))
    }
}
