//! Depotwatch State - Durable fingerprint tracking.
//!
//! This crate owns the on-disk record of the last known fingerprint per
//! catalog entry. The store loads once at startup, tolerates a missing or
//! corrupt file by starting empty, and flushes atomically so an interrupted
//! write never destroys the previous snapshot.
//!
//! # Example
//!
//! ```rust,no_run
//! use depotwatch_state::TrackingStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = TrackingStore::open("tracking_state.json")?;
//! // ... record fingerprints during a scan ...
//! store.flush()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod store;

pub use error::{Result, StateError};
pub use store::TrackingStore;
