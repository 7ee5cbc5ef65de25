//! Catalog error types.

use thiserror::Error;

/// Errors raised while loading or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Catalog file does not exist at the configured path
    #[error("catalog file not found: {path}")]
    FileNotFound {
        /// Path where the catalog was expected
        path: String,
    },

    /// Catalog file exists but is not valid JSON
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested entry is not in the catalog
    #[error("entry not found in catalog: {app_id}")]
    NotFound {
        /// The missing app id
        app_id: String,
    },

    /// I/O error reading the catalog file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
