//! Community scrape source: regex-mined HTML page.
//!
//! This is the slow path: it fetches a full community page and mines it for
//! depot/manifest pairs. The upstream throttles aggressively (403 as well as
//! 429), so the source is marked expensive and can be skipped globally.

use super::{get_with_identity, outcome_from_transport, retry_after_hint, ManifestSource};
use crate::outcome::FetchOutcome;
use crate::session::SessionRotator;
use async_trait::async_trait;
use depotwatch_core::{AppId, DepotEntry, ResolvedVia};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

/// Depot/manifest extraction patterns, tried in order over the raw HTML.
static DEPOT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // depot/<id> ... ManifestID: <gid>
        Regex::new(r"(?is)depot/(\d+).{0,500}?ManifestID[:\s]+(\d+)").expect("valid regex"),
        // JSON-ish blobs embedded in scripts
        Regex::new(r#"(?is)"depotid":\s*(\d+).{0,100}?"manifestid":\s*"(\d+)""#)
            .expect("valid regex"),
        // Depot <id> ... Manifest: <gid> table rows
        Regex::new(r"(?is)Depot\s+(\d+).{0,200}?Manifest[:\s]+(\d+)").expect("valid regex"),
    ]
});

/// Community page scrape source, last real source in the cascade.
pub struct CommunityScrapeSource {
    client: reqwest::Client,
    rotator: Arc<SessionRotator>,
    base_url: String,
    /// Base politeness delay applied before every request
    request_delay: Duration,
}

impl CommunityScrapeSource {
    /// Create a source against the given community base URL.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        rotator: Arc<SessionRotator>,
        base_url: String,
        request_delay: Duration,
    ) -> Self {
        Self {
            client,
            rotator,
            base_url,
            request_delay,
        }
    }

    /// Mine depot/manifest pairs out of page HTML, deduplicated by depot id.
    fn extract(html: &str) -> Vec<DepotEntry> {
        let mut depots: Vec<DepotEntry> = Vec::new();

        for pattern in DEPOT_PATTERNS.iter() {
            for captures in pattern.captures_iter(html) {
                let (Some(depot_id), Some(token)) = (captures.get(1), captures.get(2)) else {
                    continue;
                };
                let depot_id = depot_id.as_str();
                if depots.iter().any(|d| d.depot_id == depot_id) {
                    continue;
                }
                depots.push(DepotEntry::base(depot_id, token.as_str()));
            }
        }

        depots
    }
}

#[async_trait]
impl ManifestSource for CommunityScrapeSource {
    fn name(&self) -> &'static str {
        "community-scrape"
    }

    fn via(&self) -> ResolvedVia {
        ResolvedVia::CommunityScrape
    }

    fn expensive(&self) -> bool {
        true
    }

    async fn fetch(&self, app_id: &AppId) -> FetchOutcome {
        // Jittered politeness delay; this upstream blocks synchronized patterns
        let jitter = rand::thread_rng().gen_range(0.6..=1.4);
        tokio::time::sleep(self.request_delay.mul_f64(jitter)).await;

        let url = format!("{}/app/{app_id}", self.base_url.trim_end_matches('/'));

        let response = match get_with_identity(&self.client, &self.rotator, &url).await {
            Ok(r) => r,
            Err(e) => return outcome_from_transport(self.name(), &e),
        };

        match response.status() {
            // This upstream signals throttling as 403 as often as 429
            StatusCode::TOO_MANY_REQUESTS | StatusCode::FORBIDDEN => {
                return FetchOutcome::RateLimited {
                    retry_after: retry_after_hint(&response),
                };
            }
            s if s.is_success() => {}
            s if s.is_server_error() => {
                return FetchOutcome::Failed(format!("upstream status {s}"));
            }
            _ => return FetchOutcome::Empty,
        }

        let html = match response.text().await {
            Ok(h) => h,
            Err(e) => return outcome_from_transport(self.name(), &e),
        };

        let depots = Self::extract(&html);
        if depots.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Found(depots)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_depot_manifest_pairs() {
        let html = r#"
            <a href="/depot/1274571/">Depot page</a>
            <td>ManifestID: 684228685261925386</td>
        "#;

        let depots = CommunityScrapeSource::extract(html);
        assert_eq!(depots.len(), 1);
        assert_eq!(depots[0].depot_id, "1274571");
        assert_eq!(depots[0].version_token, "684228685261925386");
    }

    #[test]
    fn test_extract_json_blob_pattern() {
        let html = r#"<script>{"depotId": 1274571, "manifestId": "112233445566"}</script>"#;

        let depots = CommunityScrapeSource::extract(html);
        assert_eq!(depots.len(), 1);
        assert_eq!(depots[0].version_token, "112233445566");
    }

    #[test]
    fn test_extract_dedupes_by_depot_id() {
        let html = r#"
            depot/1274571 ManifestID: 111
            Depot 1274571 Manifest: 222
            Depot 1274572 Manifest: 333
        "#;

        let depots = CommunityScrapeSource::extract(html);
        assert_eq!(depots.len(), 2);
        // First pattern wins for the duplicated depot
        assert_eq!(depots[0].version_token, "111");
    }

    #[test]
    fn test_extract_no_matches() {
        assert!(CommunityScrapeSource::extract("<html><body>nothing here</body></html>")
            .is_empty());
    }
}
