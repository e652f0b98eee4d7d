//! Per-demand recommendation cache
//!
//! Tables are keyed by `(serviceTarget, capabilityTarget)` and live for one
//! simulation run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::table::RecommendationTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct RecommendationCache {
    tables: DashMap<(u32, u32), Arc<RecommendationTable>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RecommendationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, service_target: u32, capability_target: u32) -> Option<Arc<RecommendationTable>> {
        self.tables
            .get(&(service_target, capability_target))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Cached table for a demand, computing it on first use
    ///
    /// `compute` runs outside the map's locks.
    pub fn get_or_compute<F>(
        &self,
        service_target: u32,
        capability_target: u32,
        compute: F,
    ) -> Arc<RecommendationTable>
    where
        F: FnOnce() -> RecommendationTable,
    {
        if let Some(table) = self.get(service_target, capability_target) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return table;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let table = Arc::new(compute());
        let entry = self
            .tables
            .entry((service_target, capability_target))
            .or_insert(table);
        Arc::clone(entry.value())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.tables.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustbed_darwinian::{Classifier, ClassifierBundle, ClassifierError, Features};
    use trustbed_common::Note;

    struct Constant(Note);

    impl Classifier for Constant {
        fn fit(&mut self, _samples: &[(Features, Note)]) -> Result<(), ClassifierError> {
            Ok(())
        }

        fn predict(&self, _features: &Features) -> Note {
            self.0
        }
    }

    #[test]
    fn test_computes_once_per_demand() {
        let bundle = ClassifierBundle::Shared(Constant(Note::Positive));
        let cache = RecommendationCache::new();
        let mut computed = 0;

        for _ in 0..3 {
            let table = cache.get_or_compute(10, 20, || {
                computed += 1;
                RecommendationTable::compute(&bundle, 10, 20, 3)
            });
            assert_eq!(table.demand(), (10, 20));
        }
        cache.get_or_compute(20, 10, || RecommendationTable::compute(&bundle, 20, 10, 3));

        assert_eq!(computed, 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 2,
                hits: 2,
                misses: 2
            }
        );

        cache.clear();
        assert!(cache.is_empty());
    }
}
