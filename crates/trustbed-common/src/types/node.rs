//! Node - a simulated service participant
//!
//! A node has two capacities that decide whether it can satisfy a demand, and a
//! reporting strategy that decides how it rates others. A malicious node
//! bad-mouths regardless of its strategy. Capacities and rating behavior are
//! independent: a node may be a poor server, a dishonest reporter, both, or
//! neither.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::note::Note;
use super::report::Report;

/// How a node rates its counterparties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportingStrategy {
    /// Rates by comparing the counterparty's capacities against the demand
    Honest,
    /// Bad-mouths every counterparty
    AlwaysNegative,
}

/// A node in the simulated network
///
/// Identity is the node's position in its network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    service_capacity: u32,
    resource_capacity: u32,
    /// Hidden from the trust layer; overrides the rating rule with `-1`
    is_malicious: bool,
    strategy: ReportingStrategy,
    /// Probability that an honest report carries the true note
    note_accuracy: f64,
}

impl Node {
    /// Create an honest, accurate, non-malicious node
    pub fn new(service_capacity: u32, resource_capacity: u32) -> Self {
        Self {
            service_capacity,
            resource_capacity,
            is_malicious: false,
            strategy: ReportingStrategy::Honest,
            note_accuracy: 1.0,
        }
    }

    /// Create a bad-mouthing node
    pub fn bad_mouther(service_capacity: u32, resource_capacity: u32) -> Self {
        Self::new(service_capacity, resource_capacity).with_strategy(ReportingStrategy::AlwaysNegative)
    }

    pub fn with_strategy(mut self, strategy: ReportingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_malicious(mut self, is_malicious: bool) -> Self {
        self.is_malicious = is_malicious;
        self
    }

    /// Set note accuracy, clamped to [0, 1]
    pub fn with_note_accuracy(mut self, note_accuracy: f64) -> Self {
        self.note_accuracy = note_accuracy.clamp(0.0, 1.0);
        self
    }

    pub fn service_capacity(&self) -> u32 {
        self.service_capacity
    }

    pub fn resource_capacity(&self) -> u32 {
        self.resource_capacity
    }

    pub fn is_malicious(&self) -> bool {
        self.is_malicious
    }

    pub fn strategy(&self) -> ReportingStrategy {
        self.strategy
    }

    pub fn note_accuracy(&self) -> f64 {
        self.note_accuracy
    }

    /// Rate a counterparty for a demand
    ///
    /// Deterministic: the note the counterparty deserves under this node's
    /// strategy, without witness noise. Malicious nodes always return `-1`.
    pub fn rate(&self, counterparty: &Node, service_target: u32, capability_target: u32) -> Note {
        if self.is_malicious {
            return Note::Negative;
        }
        match self.strategy {
            ReportingStrategy::AlwaysNegative => Note::Negative,
            ReportingStrategy::Honest => {
                let service_met = counterparty.service_capacity >= service_target;
                let capability_met = counterparty.resource_capacity >= capability_target;
                match (service_met, capability_met) {
                    (true, true) => Note::Positive,
                    (true, false) | (false, true) => Note::Neutral,
                    (false, false) => Note::Negative,
                }
            }
        }
    }

    /// Produce a report on a counterparty
    ///
    /// Honest, non-malicious nodes with `note_accuracy < 1` sometimes report a
    /// wrong note. The random source is only consulted for such nodes.
    pub fn send_report<R: Rng + ?Sized>(
        &self,
        counterparty: &Node,
        service_target: u32,
        capability_target: u32,
        epoch: u32,
        rng: &mut R,
    ) -> Report {
        let mut note = self.rate(counterparty, service_target, capability_target);

        if !self.is_malicious
            && self.strategy == ReportingStrategy::Honest
            && self.note_accuracy < 1.0
            && rng.gen::<f64>() >= self.note_accuracy
        {
            note = note.wrong_note(rng);
        }

        Report::new(service_target, capability_target, note, epoch)
    }
}
