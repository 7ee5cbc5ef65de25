//! Secondary source: structured depot-info API.
//!
//! Queries the `info/{appid}`-shaped endpoint, which lists every depot with
//! its per-branch manifest gids. The public branch is preferred; otherwise
//! the first branch with a gid is taken.

use super::{get_with_identity, outcome_from_transport, retry_after_hint, token_of, ManifestSource};
use crate::outcome::FetchOutcome;
use crate::session::SessionRotator;
use async_trait::async_trait;
use depotwatch_core::{AppId, DepotEntry, ResolvedVia};
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;

/// Depot-info API source, second in the cascade.
pub struct SecondaryApiSource {
    client: reqwest::Client,
    rotator: Arc<SessionRotator>,
    base_url: String,
}

impl SecondaryApiSource {
    /// Create a source against the given API base URL.
    #[must_use]
    pub fn new(client: reqwest::Client, rotator: Arc<SessionRotator>, base_url: String) -> Self {
        Self {
            client,
            rotator,
            base_url,
        }
    }

    /// Extract the preferred manifest token from a depot's `manifests` map.
    ///
    /// Branch entries appear either as `{"gid": "..."}` objects or as bare
    /// token values, depending on payload vintage.
    fn manifest_token(manifests: &Value) -> Option<String> {
        let branches = manifests.as_object()?;

        let pick = |branch: &Value| -> Option<String> {
            branch.get("gid").and_then(token_of).or_else(|| token_of(branch))
        };

        if let Some(public) = branches.get("public") {
            if let Some(token) = pick(public) {
                return Some(token);
            }
        }

        branches.values().find_map(pick)
    }

    fn parse(app_id: &AppId, payload: &Value) -> Vec<DepotEntry> {
        let Some(depot_map) = payload
            .get("data")
            .and_then(|d| d.get(app_id.as_str()))
            .and_then(|a| a.get("depots"))
            .and_then(Value::as_object)
        else {
            return Vec::new();
        };

        let mut depots = Vec::new();
        for (depot_id, info) in depot_map {
            // The map mixes real depots with metadata keys like "branches"
            if !depot_id.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }

            let Some(manifests) = info.get("manifests") else {
                continue;
            };
            let Some(token) = Self::manifest_token(manifests) else {
                continue;
            };

            let supplemental = info.get("dlcappid").is_some();
            depots.push(DepotEntry {
                depot_id: depot_id.clone(),
                version_token: token,
                supplemental,
            });
        }

        depots
    }
}

#[async_trait]
impl ManifestSource for SecondaryApiSource {
    fn name(&self) -> &'static str {
        "secondary-api"
    }

    fn via(&self) -> ResolvedVia {
        ResolvedVia::SecondaryApi
    }

    async fn fetch(&self, app_id: &AppId) -> FetchOutcome {
        let url = format!("{}/v1/info/{app_id}", self.base_url.trim_end_matches('/'));

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

        let payload: Value = match response.json().await {
            Ok(p) => p,
            Err(_) => return FetchOutcome::Empty,
        };

        let depots = Self::parse(app_id, &payload);
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
    use serde_json::json;

    fn app() -> AppId {
        AppId::new("1274570").expect("valid app ID")
    }

    #[test]
    fn test_parse_depots_with_gid_objects() {
        let payload = json!({
            "data": {"1274570": {"depots": {
                "1274571": {"manifests": {"public": {"gid": "684228685261925386"}}},
                "1274572": {"manifests": {"public": {"gid": "112233"}}, "dlcappid": 1401650},
                "branches": {"public": {"buildid": "16017316"}}
            }}}
        });

        let mut depots = SecondaryApiSource::parse(&app(), &payload);
        depots.sort_by(|a, b| a.depot_id.cmp(&b.depot_id));

        assert_eq!(depots.len(), 2);
        assert_eq!(depots[0].depot_id, "1274571");
        assert_eq!(depots[0].version_token, "684228685261925386");
        assert!(!depots[0].supplemental);
        assert!(depots[1].supplemental);
    }

    #[test]
    fn test_parse_bare_token_branches() {
        let payload = json!({
            "data": {"1274570": {"depots": {
                "1274571": {"manifests": {"public": "9988776655"}}
            }}}
        });

        let depots = SecondaryApiSource::parse(&app(), &payload);
        assert_eq!(depots.len(), 1);
        assert_eq!(depots[0].version_token, "9988776655");
    }

    #[test]
    fn test_parse_prefers_public_branch() {
        let payload = json!({
            "data": {"1274570": {"depots": {
                "1274571": {"manifests": {
                    "beta": {"gid": "111"},
                    "public": {"gid": "222"}
                }}
            }}}
        });

        let depots = SecondaryApiSource::parse(&app(), &payload);
        assert_eq!(depots[0].version_token, "222");
    }

    #[test]
    fn test_parse_falls_back_to_any_branch() {
        let payload = json!({
            "data": {"1274570": {"depots": {
                "1274571": {"manifests": {"beta": {"gid": "111"}}}
            }}}
        });

        let depots = SecondaryApiSource::parse(&app(), &payload);
        assert_eq!(depots[0].version_token, "111");
    }

    #[test]
    fn test_parse_missing_data_is_empty() {
        assert!(SecondaryApiSource::parse(&app(), &json!({"status": "failed"})).is_empty());
        assert!(SecondaryApiSource::parse(&app(), &json!({})).is_empty());
    }
}
