//! The scan cycle.
//!
//! A cycle is strictly sequential over the catalog: one entry at a time,
//! with a jittered pause between entries and a longer cooldown between
//! batches. Tracking state is flushed periodically and always once at the
//! end, so a crash loses at most one flush window of fingerprints.

use depotwatch_catalog::{CatalogEntry, CatalogLoader, CatalogRegistry};
use depotwatch_core::config::ScanConfig;
use depotwatch_core::{Fingerprint, PendingNotification};
use depotwatch_notify::DeliveryQueue;
use depotwatch_resolver::ResolverChain;
use depotwatch_state::TrackingStore;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Counters for one completed scan cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Entries processed
    pub processed: usize,
    /// Entries whose fingerprint changed (first sightings included)
    pub changed: usize,
    /// Entries seen for the first time
    pub first_sightings: usize,
    /// Notifications handed to the delivery queue
    pub enqueued: usize,
}

/// Result of asking for a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion
    Completed(CycleSummary),
    /// A previous cycle was still running; nothing was done
    SkippedOverlap,
}

/// Drives full-catalog scan cycles.
pub struct ScanOrchestrator {
    loader: CatalogLoader,
    registry: CatalogRegistry,
    chain: ResolverChain,
    store: Arc<Mutex<TrackingStore>>,
    queue: Arc<DeliveryQueue>,
    config: ScanConfig,
    // Held for the duration of a cycle; try_lock failure means overlap
    cycle_guard: Mutex<()>,
}

impl ScanOrchestrator {
    /// Assemble an orchestrator over already-constructed parts.
    #[must_use]
    pub fn new(
        loader: CatalogLoader,
        registry: CatalogRegistry,
        chain: ResolverChain,
        store: Arc<Mutex<TrackingStore>>,
        queue: Arc<DeliveryQueue>,
        config: ScanConfig,
    ) -> Self {
        Self {
            loader,
            registry,
            chain,
            store,
            queue,
            config,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Run one full scan cycle.
    ///
    /// If a previous cycle is still in flight (a slow catalog can outlast
    /// the scan interval) this tick is skipped rather than stacked.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_guard.try_lock() else {
            warn!("previous scan cycle still running, skipping this tick");
            return CycleOutcome::SkippedOverlap;
        };

        // Pick up catalog edits; a failed reload keeps the cached entries
        if let Err(e) = self.registry.reload(&self.loader) {
            warn!(error = %e, "catalog reload failed, scanning cached entries");
        }

        let entries = self.registry.get_all();
        info!(
            entries = entries.len(),
            dry_run = self.config.dry_run,
            "scan cycle starting"
        );

        self.chain.stats().reset();
        let mut summary = CycleSummary::default();

        for (index, entry) in entries.iter().enumerate() {
            if index > 0 {
                self.pace(index).await;
            }

            self.process_entry(entry, &mut summary).await;
            summary.processed += 1;

            if self.config.flush_every > 0 && summary.processed % self.config.flush_every == 0 {
                self.flush_store().await;
            }
        }

        self.flush_store().await;

        let hits = self.chain.stats().snapshot();
        info!(
            processed = summary.processed,
            changed = summary.changed,
            first_sightings = summary.first_sightings,
            enqueued = summary.enqueued,
            queue_depth = self.queue.len(),
            sources = ?hits,
            "scan cycle complete"
        );

        CycleOutcome::Completed(summary)
    }

    /// Resolve one entry and record the outcome.
    async fn process_entry(&self, entry: &CatalogEntry, summary: &mut CycleSummary) {
        let snapshot = self.chain.resolve(entry).await;
        let fingerprint = Fingerprint::of(&snapshot);

        let (previous, changed) = {
            let mut store = self.store.lock().await;
            let previous = store.get(&entry.app_id).cloned();
            let changed = store.insert(entry.app_id.clone(), fingerprint.clone());
            (previous, changed)
        };

        if !changed {
            debug!(app_id = %entry.app_id, name = %entry.name, "unchanged");
            return;
        }

        summary.changed += 1;
        let first_sighting = previous.is_none();
        if first_sighting {
            summary.first_sightings += 1;
        }

        info!(
            app_id = %entry.app_id,
            name = %entry.name,
            via = %snapshot.resolved_via,
            fingerprint = %fingerprint.abbrev(),
            first_sighting,
            "change detected"
        );

        if first_sighting && !self.config.announce_first_sighting {
            return;
        }

        if self.config.dry_run {
            info!(app_id = %entry.app_id, "dry run, notification suppressed");
            return;
        }

        self.queue.push(PendingNotification {
            name: entry.name.clone(),
            app_id: entry.app_id.clone(),
            snapshot,
            previous,
        });
        summary.enqueued += 1;
    }

    /// Inter-entry pacing: a long cooldown at batch boundaries, otherwise a
    /// jittered short delay.
    async fn pace(&self, index: usize) {
        if self.config.batch_size > 0 && index % self.config.batch_size == 0 {
            debug!(
                pause_secs = self.config.batch_pause_secs,
                "batch boundary, cooling down"
            );
            tokio::time::sleep(Duration::from_secs(self.config.batch_pause_secs)).await;
            return;
        }

        if self.config.entry_delay_ms > 0 {
            let jitter = rand::thread_rng().gen_range(0.7..=1.3);
            let delay = Duration::from_millis(self.config.entry_delay_ms).mul_f64(jitter);
            tokio::time::sleep(delay).await;
        }
    }

    async fn flush_store(&self) {
        // A failed flush is not fatal mid-cycle; state stays in memory and
        // the next flush retries
        if let Err(e) = self.store.lock().await.flush() {
            warn!(error = %e, "tracking state flush failed");
        }
    }

    /// Shared handle to the tracking store, for shutdown flushing.
    #[must_use]
    pub fn store(&self) -> Arc<Mutex<TrackingStore>> {
        self.store.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use depotwatch_core::{AppId, DepotEntry, ResolvedVia};
    use depotwatch_resolver::sources::{ManifestSource, SyntheticGenerator};
    use depotwatch_resolver::{FetchOutcome, RetryPolicy};
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex as StdMutex;
    use tempfile::{tempdir, NamedTempFile};

    /// Source backed by a mutable token table the test edits between cycles.
    #[derive(Clone)]
    struct TableSource {
        tokens: Arc<StdMutex<HashMap<String, String>>>,
    }

    impl TableSource {
        fn new() -> Self {
            Self {
                tokens: Arc::new(StdMutex::new(HashMap::new())),
            }
        }

        fn set(&self, app_id: &str, token: &str) {
            self.tokens
                .lock()
                .expect("acquire token table lock")
                .insert(app_id.to_string(), token.to_string());
        }
    }

    #[async_trait]
    impl ManifestSource for TableSource {
        fn name(&self) -> &'static str {
            "table"
        }

        fn via(&self) -> ResolvedVia {
            ResolvedVia::PrimaryApi
        }

        async fn fetch(&self, app_id: &AppId) -> FetchOutcome {
            let tokens = self.tokens.lock().expect("acquire token table lock");
            match tokens.get(app_id.as_str()) {
                Some(token) => {
                    FetchOutcome::Found(vec![DepotEntry::base(
                        format!("{app_id}1"),
                        token.clone(),
                    )])
                }
                None => FetchOutcome::Empty,
            }
        }
    }

    struct Fixture {
        orchestrator: ScanOrchestrator,
        source: TableSource,
        queue: Arc<DeliveryQueue>,
        _catalog: NamedTempFile,
        _dir: tempfile::TempDir,
    }

    fn fixture(announce_first: bool, dry_run: bool) -> Fixture {
        let mut catalog = NamedTempFile::new().expect("create temp catalog");
        catalog
            .write_all(br#"[{"name": "Alpha", "appId": 100}, {"name": "Beta", "appId": 200}]"#)
            .expect("write catalog");

        let dir = tempdir().expect("create temp dir");
        let store =
            TrackingStore::open(dir.path().join("state.json")).expect("open tracking store");

        let loader = CatalogLoader::new(catalog.path()).expect("create loader");
        let registry = CatalogRegistry::load_from(&loader).expect("load registry");

        let source = TableSource::new();
        let chain = ResolverChain::new(
            vec![Box::new(source.clone())],
            SyntheticGenerator::default(),
            RetryPolicy::new(1, Duration::from_millis(1), 0.0),
            false,
        );

        let queue = Arc::new(DeliveryQueue::new(16));

        let config = ScanConfig {
            interval_secs: 1,
            batch_size: 100,
            batch_pause_secs: 0,
            entry_delay_ms: 0,
            flush_every: 100,
            announce_first_sighting: announce_first,
            dry_run,
        };

        Fixture {
            orchestrator: ScanOrchestrator::new(
                loader,
                registry,
                chain,
                Arc::new(Mutex::new(store)),
                queue.clone(),
                config,
            ),
            source,
            queue,
            _catalog: catalog,
            _dir: dir,
        }
    }

    fn summary(outcome: CycleOutcome) -> CycleSummary {
        match outcome {
            CycleOutcome::Completed(s) => s,
            CycleOutcome::SkippedOverlap => panic!("cycle unexpectedly skipped"),
        }
    }

    #[tokio::test]
    async fn test_first_cycle_seeds_without_notifying() {
        let fx = fixture(false, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        let s = summary(fx.orchestrator.run_cycle().await);
        assert_eq!(s.processed, 2);
        assert_eq!(s.changed, 2);
        assert_eq!(s.first_sightings, 2);
        // First sightings seed state silently by default
        assert_eq!(s.enqueued, 0);
        assert!(fx.queue.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_cycle_enqueues_nothing() {
        let fx = fixture(false, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        summary(fx.orchestrator.run_cycle().await);
        let s = summary(fx.orchestrator.run_cycle().await);
        assert_eq!(s.changed, 0);
        assert!(fx.queue.is_empty());
    }

    #[tokio::test]
    async fn test_change_enqueues_with_previous_fingerprint() {
        let fx = fixture(false, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        summary(fx.orchestrator.run_cycle().await);

        fx.source.set("100", "aaa2");
        let s = summary(fx.orchestrator.run_cycle().await);

        assert_eq!(s.changed, 1);
        assert_eq!(s.enqueued, 1);
        assert_eq!(fx.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_announce_first_sighting() {
        let fx = fixture(true, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        let s = summary(fx.orchestrator.run_cycle().await);
        assert_eq!(s.enqueued, 2);
        assert_eq!(fx.queue.len(), 2);
    }

    #[tokio::test]
    async fn test_dry_run_tracks_without_enqueueing() {
        let fx = fixture(false, true);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        summary(fx.orchestrator.run_cycle().await);
        fx.source.set("100", "aaa2");
        let s = summary(fx.orchestrator.run_cycle().await);

        assert_eq!(s.changed, 1);
        assert_eq!(s.enqueued, 0);
        assert!(fx.queue.is_empty());
    }

    #[tokio::test]
    async fn test_state_survives_cycles_via_flush() {
        let fx = fixture(false, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        summary(fx.orchestrator.run_cycle().await);

        let store = fx.orchestrator.store();
        let store = store.lock().await;
        assert_eq!(store.len(), 2);
        assert!(!store.is_dirty());
        assert!(store.path().exists());
    }

    /// Sink that records everything delivered to it.
    struct RecordingSink {
        delivered: StdMutex<Vec<PendingNotification>>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                delivered: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl depotwatch_notify::NotificationSink for RecordingSink {
        async fn deliver(
            &self,
            notification: &PendingNotification,
        ) -> depotwatch_notify::DeliveryOutcome {
            self.delivered
                .lock()
                .expect("acquire delivered lock")
                .push(notification.clone());
            depotwatch_notify::DeliveryOutcome::Delivered
        }
    }

    #[tokio::test]
    async fn test_three_scan_scenario_end_to_end() {
        let fx = fixture(false, false);
        fx.source.set("100", "aaa");
        fx.source.set("200", "bbb");

        // Scan 1: seed, no notifications
        summary(fx.orchestrator.run_cycle().await);
        // Scan 2: unchanged, still nothing
        summary(fx.orchestrator.run_cycle().await);
        assert!(fx.queue.is_empty());

        // Capture the seeded fingerprint for the entry about to change
        let seeded = {
            let store = fx.orchestrator.store();
            let store = store.lock().await;
            store
                .get(&AppId::new("100").expect("valid app ID"))
                .cloned()
                .expect("seeded fingerprint")
        };

        // Scan 3: one entry changed
        fx.source.set("100", "aaa2");
        summary(fx.orchestrator.run_cycle().await);
        assert_eq!(fx.queue.len(), 1);

        // Next drain tick delivers it with the pre-change fingerprint
        let sink = RecordingSink::new();
        fx.queue.drain_one(&sink).await;
        let delivered = sink.delivered.lock().expect("acquire delivered lock");
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].name, "Alpha");
        assert_eq!(delivered[0].previous.as_ref(), Some(&seeded));
        assert!(fx.queue.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_entry_gets_synthetic_snapshot() {
        let fx = fixture(true, false);
        // Only one entry resolvable; the other falls through to synthetic
        fx.source.set("100", "aaa");

        let s = summary(fx.orchestrator.run_cycle().await);
        assert_eq!(s.processed, 2);
        assert_eq!(s.changed, 2);
        assert_eq!(s.enqueued, 2);
    }
}
