//! Recommendation table for one demand
//!
//! Row = client, column = candidate server. The diagonal is empty. A client
//! without a trained model sees every server as `-1`, so it is never
//! recommended anything.

use rayon::prelude::*;
use trustbed_common::Note;
use trustbed_darwinian::{Classifier, ClassifierBundle};

/// Candidate servers for one client, split by predicted note
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    /// Predicted `1`
    pub trusted: Vec<usize>,
    /// Predicted `0`
    pub acceptable: Vec<usize>,
}

impl Candidates {
    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty() && self.acceptable.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationTable {
    service_target: u32,
    capability_target: u32,
    size: usize,
    notes: Vec<Option<Note>>,
}

impl RecommendationTable {
    /// Predict every (client, server) pair for a demand
    pub fn compute<C: Classifier + Sync>(
        bundle: &ClassifierBundle<C>,
        service_target: u32,
        capability_target: u32,
        node_count: usize,
    ) -> Self {
        let rows: Vec<Vec<Option<Note>>> = (0..node_count)
            .into_par_iter()
            .map(|client| {
                (0..node_count)
                    .map(|server| {
                        if server == client {
                            return None;
                        }
                        Some(
                            bundle
                                .predict(client, server, service_target, capability_target)
                                .unwrap_or(Note::Negative),
                        )
                    })
                    .collect()
            })
            .collect();

        Self {
            service_target,
            capability_target,
            size: node_count,
            notes: rows.into_iter().flatten().collect(),
        }
    }

    pub fn demand(&self) -> (u32, u32) {
        (self.service_target, self.capability_target)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Predicted note of `server` for `client`
    pub fn note(&self, client: usize, server: usize) -> Option<Note> {
        if client >= self.size || server >= self.size {
            return None;
        }
        self.notes[client * self.size + server]
    }

    /// Trusted and acceptable servers for `client`, in ascending id order
    pub fn candidates(&self, client: usize) -> Candidates {
        let mut candidates = Candidates::default();
        for server in 0..self.size {
            match self.note(client, server) {
                Some(Note::Positive) => candidates.trusted.push(server),
                Some(Note::Neutral) => candidates.acceptable.push(server),
                _ => {}
            }
        }
        candidates
    }
}
