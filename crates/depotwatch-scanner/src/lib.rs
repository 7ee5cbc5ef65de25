//! Depotwatch Scanner - The scan cycle orchestrator.
//!
//! One cycle walks the catalog in order, resolves each entry through the
//! source cascade, compares the resulting fingerprint against durable
//! tracking state, and enqueues a notification for every detected change.
//! Pacing (inter-entry jitter, batch cooldowns, periodic flushes) lives
//! here; the resolver and the delivery queue know nothing about it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod orchestrator;

pub use orchestrator::{CycleOutcome, CycleSummary, ScanOrchestrator};
