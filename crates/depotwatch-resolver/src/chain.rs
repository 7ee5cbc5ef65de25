//! The resolver cascade.
//!
//! Sources are evaluated in priority order by a single combinator that
//! short-circuits on the first non-empty result, applies bounded backoff on
//! rate-limit signals, and falls through on empty or failed attempts. The
//! terminal synthetic generator guarantees a snapshot for every entry.

use crate::outcome::FetchOutcome;
use crate::retry::RetryPolicy;
use crate::session::SessionRotator;
use crate::sources::{
    CommunityScrapeSource, ManifestSource, PrimaryApiSource, SecondaryApiSource,
    SyntheticGenerator,
};
use crate::stats::ResolveStats;
use depotwatch_catalog::CatalogEntry;
use depotwatch_core::config::SourcesConfig;
use depotwatch_core::{CoreError, ManifestSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Ordered cascade of manifest sources with a synthetic terminal fallback.
pub struct ResolverChain {
    sources: Vec<Box<dyn ManifestSource>>,
    synthetic: SyntheticGenerator,
    retry: RetryPolicy,
    skip_expensive: bool,
    stats: Arc<ResolveStats>,
}

impl ResolverChain {
    /// Assemble a chain from explicit parts. Sources are tried in the order
    /// given.
    #[must_use]
    pub fn new(
        sources: Vec<Box<dyn ManifestSource>>,
        synthetic: SyntheticGenerator,
        retry: RetryPolicy,
        skip_expensive: bool,
    ) -> Self {
        Self {
            sources,
            synthetic,
            retry,
            skip_expensive,
            stats: Arc::new(ResolveStats::new()),
        }
    }

    /// Build the production chain from configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be constructed.
    pub fn from_config(config: &SourcesConfig) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CoreError::Resolver(format!("failed to create HTTP client: {e}")))?;

        let rotator = Arc::new(SessionRotator::new());

        let sources: Vec<Box<dyn ManifestSource>> = vec![
            Box::new(PrimaryApiSource::new(
                client.clone(),
                rotator.clone(),
                config.primary_url.clone(),
            )),
            Box::new(SecondaryApiSource::new(
                client.clone(),
                rotator.clone(),
                config.secondary_url.clone(),
            )),
            Box::new(CommunityScrapeSource::new(
                client,
                rotator,
                config.community_url.clone(),
                Duration::from_millis(config.scrape_delay_ms),
            )),
        ];

        let retry = RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.retry_base_ms),
            0.3,
        );

        Ok(Self::new(
            sources,
            SyntheticGenerator::new(config.synthetic_supplemental_cap),
            retry,
            config.skip_expensive,
        ))
    }

    /// Shared statistics handle.
    #[must_use]
    pub fn stats(&self) -> Arc<ResolveStats> {
        self.stats.clone()
    }

    /// Resolve the current manifest snapshot for one catalog entry.
    ///
    /// Never fails and never returns an empty depot list: if every real
    /// source is exhausted the result is a synthetic snapshot.
    pub async fn resolve(&self, entry: &CatalogEntry) -> ManifestSnapshot {
        for source in &self.sources {
            if source.expensive() && self.skip_expensive {
                debug!(source = source.name(), "skipping expensive source");
                continue;
            }

            if let Some(depots) = self.attempt_source(source.as_ref(), entry).await {
                self.stats.record_hit(source.name());
                debug!(
                    app_id = %entry.app_id,
                    source = source.name(),
                    depots = depots.len(),
                    "resolved"
                );
                return ManifestSnapshot::new(entry.app_id.clone(), depots, source.via());
            }
        }

        info!(app_id = %entry.app_id, name = %entry.name, "all sources exhausted, synthesizing");
        self.stats.record_hit("synthetic");
        self.synthetic.generate(entry)
    }

    /// Run one source to completion: immediate fall-through on empty or
    /// failed attempts, bounded backoff on rate limits.
    async fn attempt_source(
        &self,
        source: &dyn ManifestSource,
        entry: &CatalogEntry,
    ) -> Option<Vec<depotwatch_core::DepotEntry>> {
        let mut attempt = 0;

        loop {
            match source.fetch(&entry.app_id).await {
                FetchOutcome::Found(depots) if !depots.is_empty() => return Some(depots),
                FetchOutcome::Found(_) | FetchOutcome::Empty => {
                    debug!(app_id = %entry.app_id, source = source.name(), "no data");
                    return None;
                }
                FetchOutcome::Failed(reason) => {
                    debug!(
                        app_id = %entry.app_id,
                        source = source.name(),
                        reason,
                        "attempt failed"
                    );
                    return None;
                }
                FetchOutcome::RateLimited { retry_after } => {
                    if !self.retry.allows(attempt + 1) {
                        warn!(
                            app_id = %entry.app_id,
                            source = source.name(),
                            attempts = attempt + 1,
                            "rate limited, retries exhausted"
                        );
                        return None;
                    }

                    let delay = self.retry.delay_for(attempt, retry_after);
                    warn!(
                        app_id = %entry.app_id,
                        source = source.name(),
                        attempt = attempt + 1,
                        max = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
