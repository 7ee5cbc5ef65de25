//! The notification sink seam.

use async_trait::async_trait;
use depotwatch_core::PendingNotification;
use std::time::Duration;

/// What one delivery attempt produced.
///
/// Delivery is infallible at the type level: transport errors surface as
/// [`DeliveryOutcome::Failed`] so the drain loop decides what to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The sink accepted the notification
    Delivered,
    /// The sink is throttling; retry the same notification later
    RateLimited {
        /// Sink-provided cooldown hint, when present
        retry_after: Option<Duration>,
    },
    /// The sink rejected the notification or the transport failed
    Failed(String),
}

/// Anything that can receive a notification.
///
/// The production implementation is [`WebhookSink`]; tests substitute
/// scripted sinks.
///
/// [`WebhookSink`]: crate::webhook::WebhookSink
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Attempt to deliver one notification.
    async fn deliver(&self, notification: &PendingNotification) -> DeliveryOutcome;
}
