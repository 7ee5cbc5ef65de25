//! Per-source resolution statistics.

use std::collections::BTreeMap;
use std::sync::Mutex;

/// Counters for how often each source produced a snapshot.
///
/// Reset at the start of every scan cycle and reported in the cycle summary.
#[derive(Debug, Default)]
pub struct ResolveStats {
    hits: Mutex<BTreeMap<&'static str, u64>>,
}

impl ResolveStats {
    /// Create an empty counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful resolution via the named source.
    pub fn record_hit(&self, source: &'static str) {
        let mut hits = self.hits.lock().expect("acquire stats lock");
        *hits.entry(source).or_insert(0) += 1;
    }

    /// Snapshot of counters in source-name order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        let hits = self.hits.lock().expect("acquire stats lock");
        hits.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Clear all counters.
    pub fn reset(&self) {
        self.hits.lock().expect("acquire stats lock").clear();
    }
}
