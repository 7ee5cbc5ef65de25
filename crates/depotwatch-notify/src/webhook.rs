//! Webhook sink: POSTs embed payloads to a Discord-compatible endpoint.

use crate::sink::{DeliveryOutcome, NotificationSink};
use async_trait::async_trait;
use depotwatch_core::PendingNotification;
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Discord-compatible webhook sink.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    /// Create a sink posting to the given webhook URL.
    #[must_use]
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    /// Build the embed payload for one notification.
    fn payload(notification: &PendingNotification) -> Value {
        let snapshot = &notification.snapshot;

        let (title, color) = if notification.previous.is_some() {
            (format!("\u{1f514} {} updated", notification.name), 0x00b0_f4)
        } else {
            (format!("\u{1f195} {} now tracked", notification.name), 0x57f2_87)
        };

        let mut fields = vec![
            json!({"name": "App ID", "value": snapshot.app_id.to_string(), "inline": true}),
            json!({"name": "Source", "value": snapshot.resolved_via.label(), "inline": true}),
            json!({"name": "Depots", "value": snapshot.depots.len().to_string(), "inline": true}),
        ];

        let supplemental = snapshot.supplemental_count();
        if supplemental > 0 {
            fields.push(json!({
                "name": "Supplemental",
                "value": supplemental.to_string(),
                "inline": true
            }));
        }

        if snapshot.is_synthetic() {
            fields.push(json!({
                "name": "Note",
                "value": "generated snapshot, upstream data unavailable",
                "inline": false
            }));
        }

        fields.push(json!({
            "name": "Depot versions",
            "value": Self::depot_table(snapshot),
            "inline": false
        }));

        json!({
            "embeds": [{
                "title": title,
                "url": format!("https://store.steampowered.com/app/{}", snapshot.app_id),
                "color": color,
                "fields": fields,
                "timestamp": snapshot.resolved_at.to_rfc3339(),
            }]
        })
    }

    /// Compact depot/token listing, truncated so huge titles don't blow the
    /// embed field limit.
    fn depot_table(snapshot: &depotwatch_core::ManifestSnapshot) -> String {
        const MAX_ROWS: usize = 8;

        let mut rows: Vec<String> = snapshot
            .depots
            .iter()
            .take(MAX_ROWS)
            .map(|d| format!("`{}` → `{}`", d.depot_id, d.version_token))
            .collect();

        if snapshot.depots.len() > MAX_ROWS {
            rows.push(format!("… and {} more", snapshot.depots.len() - MAX_ROWS));
        }

        rows.join("\n")
    }

    /// Cooldown hint from a 429 response: `Retry-After` header first, then
    /// the JSON body's `retry_after` seconds field.
    async fn retry_after_hint(response: Response) -> Option<Duration> {
        if let Some(secs) = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            return Some(Duration::from_secs(secs));
        }

        let body: Value = response.json().await.ok()?;
        body.get("retry_after")
            .and_then(Value::as_f64)
            .filter(|s| *s >= 0.0)
            .map(Duration::from_secs_f64)
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, notification: &PendingNotification) -> DeliveryOutcome {
        let payload = Self::payload(notification);

        let response = match self.client.post(&self.url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => return DeliveryOutcome::Failed(format!("webhook transport: {e}")),
        };

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = Self::retry_after_hint(response).await;
                debug!(?retry_after, "webhook rate limited");
                DeliveryOutcome::RateLimited { retry_after }
            }
            s if s.is_success() => {
                debug!(app_id = %notification.app_id, "notification delivered");
                DeliveryOutcome::Delivered
            }
            s => DeliveryOutcome::Failed(format!("webhook status {s}")),
        }
    }
}
