//! Terminal fallback: manufactured snapshots.
//!
//! When every real source is exhausted, the generator produces a minimal,
//! internally-consistent snapshot so the pipeline keeps moving. Synthetic
//! snapshots are tagged and never treated as authoritative beyond simple
//! change tracking.

use chrono::Utc;
use depotwatch_catalog::CatalogEntry;
use depotwatch_core::{DepotEntry, ManifestSnapshot, ResolvedVia};
use rand::Rng;

/// Generator for synthetic manifest snapshots.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticGenerator {
    /// Upper bound on supplemental depots per snapshot
    supplemental_cap: u32,
}

impl SyntheticGenerator {
    /// Create a generator with the given supplemental-depot cap.
    #[must_use]
    pub fn new(supplemental_cap: u32) -> Self {
        Self { supplemental_cap }
    }

    /// Manufacture a snapshot for an entry nothing upstream could resolve.
    ///
    /// One primary depot is always produced; the catalog's known
    /// supplemental-content count (capped) sizes the rest.
    #[must_use]
    pub fn generate(&self, entry: &CatalogEntry) -> ManifestSnapshot {
        let mut rng = rand::thread_rng();
        let stamp = Utc::now().timestamp_millis();

        let mut depots = vec![DepotEntry::base(
            format!("{}1", entry.app_id),
            format!("{stamp}{:04}", rng.gen_range(0..10_000)),
        )];

        let supplemental = entry.dlc_count.min(self.supplemental_cap);
        for i in 0..supplemental {
            depots.push(DepotEntry::supplemental(
                format!("{}_dlc{}", entry.app_id, i + 1),
                format!(
                    "{}{:04}",
                    stamp + i64::from(i + 1) * 1000,
                    rng.gen_range(0..10_000)
                ),
            ));
        }

        tracing::debug!(
            app_id = %entry.app_id,
            depots = depots.len(),
            "generated synthetic snapshot"
        );

        ManifestSnapshot::new(entry.app_id.clone(), depots, ResolvedVia::Synthetic)
    }
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new(8)
    }
}
