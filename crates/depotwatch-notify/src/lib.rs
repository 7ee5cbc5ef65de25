//! Depotwatch Notify - Throttled notification delivery.
//!
//! Detected changes are queued in memory and drained one at a time by a
//! separate delivery loop. The sink reports rate-limit signals explicitly;
//! a throttled notification goes back to the head of the queue so ordering
//! survives the retry. The queue is bounded: under sustained sink outage
//! the oldest notifications are dropped first.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod queue;
pub mod sink;
pub mod webhook;

pub use queue::{DeliveryQueue, DrainResult};
pub use sink::{DeliveryOutcome, NotificationSink};
pub use webhook::WebhookSink;
