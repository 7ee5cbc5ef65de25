//! Bounded in-memory delivery queue.
//!
//! The scanner pushes to the tail; the drain loop pops from the head, one
//! notification per tick. A throttled notification is reinserted at the
//! head so no later notification overtakes it. When the queue is full the
//! oldest entry is dropped to make room.

use crate::sink::{DeliveryOutcome, NotificationSink};
use depotwatch_core::PendingNotification;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// What one drain tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainResult {
    /// Nothing queued
    Empty,
    /// Head notification delivered and removed
    Delivered,
    /// Sink throttled; head notification reinserted for the next tick
    Throttled {
        /// Sink-provided cooldown hint, when present
        retry_after: Option<Duration>,
    },
    /// Head notification failed permanently and was discarded
    Discarded(String),
}

/// FIFO queue of pending notifications shared between the scan and drain
/// loops.
#[derive(Debug)]
pub struct DeliveryQueue {
    inner: Mutex<VecDeque<PendingNotification>>,
    max_len: usize,
}

impl DeliveryQueue {
    /// Create a queue holding at most `max_len` notifications.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            max_len: max_len.max(1),
        }
    }

    /// Enqueue a notification at the tail.
    ///
    /// If the queue is full the oldest entry is dropped first; stale news
    /// is worth less than fresh news.
    pub fn push(&self, notification: PendingNotification) {
        let mut queue = self.inner.lock().expect("acquire queue lock");
        if queue.len() >= self.max_len {
            if let Some(dropped) = queue.pop_front() {
                warn!(
                    app_id = %dropped.app_id,
                    name = %dropped.name,
                    "delivery queue full, dropping oldest notification"
                );
            }
        }
        debug!(app_id = %notification.app_id, depth = queue.len() + 1, "notification queued");
        queue.push_back(notification);
    }

    /// Number of queued notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().expect("acquire queue lock").len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("acquire queue lock").is_empty()
    }

    /// Attempt delivery of the head notification.
    ///
    /// The lock is not held across the sink call, so pushes from the scan
    /// loop never wait on delivery.
    pub async fn drain_one(&self, sink: &dyn NotificationSink) -> DrainResult {
        let Some(notification) = self.inner.lock().expect("acquire queue lock").pop_front()
        else {
            return DrainResult::Empty;
        };

        match sink.deliver(&notification).await {
            DeliveryOutcome::Delivered => DrainResult::Delivered,
            DeliveryOutcome::RateLimited { retry_after } => {
                // Head reinsertion keeps delivery order across the retry
                self.inner
                    .lock()
                    .expect("acquire queue lock")
                    .push_front(notification);
                DrainResult::Throttled { retry_after }
            }
            DeliveryOutcome::Failed(reason) => {
                warn!(
                    app_id = %notification.app_id,
                    reason,
                    "notification discarded after delivery failure"
                );
                DrainResult::Discarded(reason)
            }
        }
    }
}
