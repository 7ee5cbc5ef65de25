//! Primary source: structured build/branch API.
//!
//! Queries the `GetAppBetas`-shaped endpoint. Every branch that reports a
//! build id becomes one depot entry; the build id is the version token.

use super::{get_with_identity, outcome_from_transport, retry_after_hint, token_of, ManifestSource};
use crate::outcome::FetchOutcome;
use crate::session::SessionRotator;
use async_trait::async_trait;
use depotwatch_core::{AppId, DepotEntry, ResolvedVia};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Build/branch API source, first in the cascade.
pub struct PrimaryApiSource {
    client: reqwest::Client,
    rotator: Arc<SessionRotator>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BetasEnvelope {
    #[serde(default)]
    response: Option<BetasBody>,
}

#[derive(Debug, Deserialize)]
struct BetasBody {
    // BTreeMap keeps branch iteration deterministic
    #[serde(default)]
    betas: Option<BTreeMap<String, BranchInfo>>,
}

#[derive(Debug, Deserialize)]
struct BranchInfo {
    #[serde(default)]
    buildid: Option<serde_json::Value>,
}

impl PrimaryApiSource {
    /// Create a source against the given API base URL.
    #[must_use]
    pub fn new(client: reqwest::Client, rotator: Arc<SessionRotator>, base_url: String) -> Self {
        Self {
            client,
            rotator,
            base_url,
        }
    }

    fn parse(app_id: &AppId, envelope: &BetasEnvelope) -> Vec<DepotEntry> {
        let Some(betas) = envelope.response.as_ref().and_then(|b| b.betas.as_ref()) else {
            return Vec::new();
        };

        let mut depots = Vec::new();

        // Public branch leads; the rest follow in name order.
        if let Some(token) = betas.get("public").and_then(|b| b.buildid.as_ref()).and_then(token_of)
        {
            depots.push(DepotEntry::base(format!("{app_id}_public"), token));
        }

        for (branch, info) in betas {
            if branch == "public" {
                continue;
            }
            if let Some(token) = info.buildid.as_ref().and_then(token_of) {
                depots.push(DepotEntry::base(format!("{app_id}_{branch}"), token));
            }
        }

        depots
    }
}

#[async_trait]
impl ManifestSource for PrimaryApiSource {
    fn name(&self) -> &'static str {
        "primary-api"
    }

    fn via(&self) -> ResolvedVia {
        ResolvedVia::PrimaryApi
    }

    async fn fetch(&self, app_id: &AppId) -> FetchOutcome {
        let url = format!(
            "{}/ISteamApps/GetAppBetas/v1/?appid={app_id}",
            self.base_url.trim_end_matches('/')
        );

        let response = match get_with_identity(&self.client, &self.rotator, &url).await {
            Ok(r) => r,
            Err(e) => return outcome_from_transport(self.name(), &e),
        };

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
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

        // A payload that doesn't match the expected shape is "no data"
        let envelope: BetasEnvelope = match response.json().await {
            Ok(e) => e,
            Err(_) => return FetchOutcome::Empty,
        };

        let depots = Self::parse(app_id, &envelope);
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

    fn app() -> AppId {
        AppId::new("1274570").expect("valid app ID")
    }

    #[test]
    fn test_parse_public_and_beta_branches() {
        let envelope: BetasEnvelope = serde_json::from_str(
            r#"{"response": {"betas": {
                "public": {"buildid": 16017316},
                "beta": {"buildid": "16020001"}
            }}}"#,
        )
        .expect("parse envelope");

        let depots = PrimaryApiSource::parse(&app(), &envelope);
        assert_eq!(depots.len(), 2);
        assert_eq!(depots[0].depot_id, "1274570_public");
        assert_eq!(depots[0].version_token, "16017316");
        assert_eq!(depots[1].depot_id, "1274570_beta");
        assert_eq!(depots[1].version_token, "16020001");
    }

    #[test]
    fn test_parse_empty_response() {
        let envelope: BetasEnvelope =
            serde_json::from_str(r#"{"response": {}}"#).expect("parse envelope");
        assert!(PrimaryApiSource::parse(&app(), &envelope).is_empty());

        let envelope: BetasEnvelope = serde_json::from_str("{}").expect("parse envelope");
        assert!(PrimaryApiSource::parse(&app(), &envelope).is_empty());
    }

    #[test]
    fn test_parse_branch_without_buildid_skipped() {
        let envelope: BetasEnvelope = serde_json::from_str(
            r#"{"response": {"betas": {"public": {}, "beta": {"buildid": 7}}}}"#,
        )
        .expect("parse envelope");

        let depots = PrimaryApiSource::parse(&app(), &envelope);
        assert_eq!(depots.len(), 1);
        assert_eq!(depots[0].depot_id, "1274570_beta");
    }
}
