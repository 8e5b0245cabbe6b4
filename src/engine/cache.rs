use super::projection::MatchupProjection;
use crate::data::{DatasetVersion, Matchup};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Memoized matchup projections keyed by (matchup, dataset version).
///
/// A projection is a pure function of its key, so entries never go stale;
/// a new dataset simply produces new keys.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    entries: Mutex<HashMap<(Matchup, DatasetVersion), Arc<MatchupProjection>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, matchup: &Matchup, version: &DatasetVersion) -> Option<Arc<MatchupProjection>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(&(matchup.clone(), version.clone())).cloned()
    }

    /// Return the cached projection or compute and store it. The lock is not
    /// held while computing; two racing misses compute the same value.
    pub fn get_or_compute<F>(
        &self,
        matchup: &Matchup,
        version: &DatasetVersion,
        compute: F,
    ) -> Arc<MatchupProjection>
    where
        F: FnOnce() -> MatchupProjection,
    {
        if let Some(hit) = self.get(matchup, version) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return hit;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(compute());
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .entry((matchup.clone(), version.clone()))
            .or_insert(computed)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop entries for every version except `keep`.
    pub fn retain_version(&self, keep: &DatasetVersion) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(_, v), _| v == keep);
    }
}
