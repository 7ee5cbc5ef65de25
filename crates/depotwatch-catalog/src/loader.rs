//! Catalog loading from the external JSON file.
//!
//! Invalid records are logged as warnings and skipped so one malformed
//! entry cannot block tracking of the rest of the catalog.

use crate::entry::{CatalogEntry, RawCatalogEntry};
use crate::error::{CatalogError, Result};
use depotwatch_core::AppId;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loader for the read-only catalog file.
pub struct CatalogLoader {
    /// Path to the JSON catalog
    catalog_path: PathBuf,
}

impl CatalogLoader {
    /// Create a new loader for the given catalog file.
    ///
    /// # Errors
    /// Returns error if the file doesn't exist.
    pub fn new(catalog_path: impl Into<PathBuf>) -> Result<Self> {
        let catalog_path = catalog_path.into();

        if !catalog_path.is_file() {
            return Err(CatalogError::FileNotFound {
                path: catalog_path.display().to_string(),
            });
        }

        Ok(Self { catalog_path })
    }

    /// Path this loader reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.catalog_path
    }

    /// Load all catalog entries.
    ///
    /// Records that fail validation are logged as warnings and skipped.
    ///
    /// # Errors
    /// Returns error if the file can't be read or is not a JSON array.
    pub fn load_all(&self) -> Result<Vec<CatalogEntry>> {
        let contents = std::fs::read_to_string(&self.catalog_path)?;
        let raw_entries: Vec<RawCatalogEntry> = serde_json::from_str(&contents)?;

        let mut entries = Vec::with_capacity(raw_entries.len());
        for raw in raw_entries {
            let id = raw.app_id.into_string();
            match AppId::new(&id) {
                Ok(app_id) => entries.push(CatalogEntry {
                    app_id,
                    name: raw.name,
                    dlc_count: raw.dlc_count,
                }),
                Err(e) => {
                    warn!(name = %raw.name, app_id = %id, error = %e, "skipping invalid catalog entry");
                }
            }
        }

        info!(
            count = entries.len(),
            path = %self.catalog_path.display(),
            "loaded catalog entries"
        );

        Ok(entries)
    }
}
