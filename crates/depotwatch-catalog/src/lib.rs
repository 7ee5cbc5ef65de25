//! Depotwatch Catalog - Read-only catalog of tracked titles.
//!
//! The catalog is an external collaborator: a JSON file maintained by
//! separate tooling. This crate loads it and caches the entries in memory
//! for the duration of a scan cycle. Nothing here ever mutates the file.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod entry;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use entry::CatalogEntry;
pub use error::{CatalogError, Result};
pub use loader::CatalogLoader;
pub use registry::CatalogRegistry;
