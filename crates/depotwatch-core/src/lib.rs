//! Depotwatch Core - Foundation crate for the depotwatch service.
//!
//! This crate provides the shared data model, error handling, and
//! configuration management that all other depotwatch crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with environment overrides
//! - [`types`] - Shared domain types (`AppId`, `ManifestSnapshot`, `Fingerprint`)
//!
//! # Example
//!
//! ```rust
//! use depotwatch_core::{AppId, DepotEntry, Fingerprint, ManifestSnapshot, ResolvedVia};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = ManifestSnapshot::new(
//!     AppId::new("440")?,
//!     vec![DepotEntry::base("441", "8574203319")],
//!     ResolvedVia::PrimaryApi,
//! );
//! let fingerprint = Fingerprint::of(&snapshot);
//! assert!(!fingerprint.as_str().is_empty());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, CatalogConfig, DeliveryConfig, ScanConfig, SourcesConfig, StateConfig,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{
    AppId, DepotEntry, Fingerprint, ManifestSnapshot, PendingNotification, ResolvedVia,
};
