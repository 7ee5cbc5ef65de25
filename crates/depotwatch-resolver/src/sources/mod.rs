//! Upstream manifest sources.
//!
//! Each source attempts to resolve the current depot list for one catalog
//! entry. Sources are independent; the [`crate::ResolverChain`] owns the
//! cascade order and the backoff behavior between attempts.

mod community;
mod primary;
mod secondary;
mod synthetic;

pub use community::CommunityScrapeSource;
pub use primary::PrimaryApiSource;
pub use secondary::SecondaryApiSource;
pub use synthetic::SyntheticGenerator;

use crate::outcome::FetchOutcome;
use crate::session::SessionRotator;
use async_trait::async_trait;
use depotwatch_core::{AppId, ResolvedVia};
use std::sync::Arc;
use std::time::Duration;

/// One upstream source in the resolver cascade.
///
/// Implementations never panic and never return errors: transport and parse
/// failures are mapped into [`FetchOutcome`] variants so the chain can
/// dispatch on data, not on error shapes.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Short name used in logs and statistics.
    fn name(&self) -> &'static str;

    /// How snapshots from this source are tagged.
    fn via(&self) -> ResolvedVia;

    /// Whether this source is high-latency and rate-limit sensitive.
    ///
    /// Expensive sources are skipped entirely when the global
    /// `skip_expensive` flag is set.
    fn expensive(&self) -> bool {
        false
    }

    /// Attempt to resolve depot data for one entry.
    async fn fetch(&self, app_id: &AppId) -> FetchOutcome;
}

/// Issue a GET with the next rotating client identity.
pub(crate) async fn get_with_identity(
    client: &reqwest::Client,
    rotator: &Arc<SessionRotator>,
    url: &str,
) -> reqwest::Result<reqwest::Response> {
    let identity = rotator.next();
    client
        .get(url)
        .header(reqwest::header::USER_AGENT, identity.user_agent)
        .header(reqwest::header::ACCEPT_LANGUAGE, identity.accept_language)
        .send()
        .await
}

/// Extract the `Retry-After` hint (seconds form) from a throttled response.
pub(crate) fn retry_after_hint(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Map a transport error into the outcome the chain should see.
pub(crate) fn outcome_from_transport(source: &str, err: &reqwest::Error) -> FetchOutcome {
    tracing::debug!(source, error = %err, "source request failed");
    FetchOutcome::Failed(err.to_string())
}

/// Pull an opaque version token out of a loosely-typed JSON value.
///
/// Upstream payloads carry build ids and manifest gids as either strings or
/// bare numbers.
pub(crate) fn token_of(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
