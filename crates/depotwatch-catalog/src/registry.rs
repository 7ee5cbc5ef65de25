//! In-memory catalog registry with reload support.

use crate::entry::CatalogEntry;
use crate::error::{CatalogError, Result};
use crate::loader::CatalogLoader;
use depotwatch_core::AppId;
use std::sync::{Arc, RwLock};
use tracing::info;

/// In-memory cache of catalog entries.
///
/// The registry preserves catalog order (scans iterate entries in the order
/// the external tooling wrote them) and is reloaded once per scan cycle so
/// catalog edits are picked up without a restart.
#[derive(Clone)]
pub struct CatalogRegistry {
    /// Cached entries in catalog order
    entries: Arc<RwLock<Vec<CatalogEntry>>>,
}

impl CatalogRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a registry and load all entries from the given loader.
    ///
    /// # Errors
    /// Returns error if loading fails.
    pub fn load_from(loader: &CatalogLoader) -> Result<Self> {
        let registry = Self::new();
        registry.reload(loader)?;
        Ok(registry)
    }

    /// Reload all entries from the loader, replacing the current cache.
    ///
    /// # Errors
    /// Returns error if loading fails; the previous cache is kept in that case.
    pub fn reload(&self, loader: &CatalogLoader) -> Result<()> {
        let loaded = loader.load_all()?;

        let mut cache = self.entries.write().expect("acquire write lock on entries");
        *cache = loaded;

        info!(count = cache.len(), "reloaded catalog");

        Ok(())
    }

    /// Get a catalog entry by app id.
    ///
    /// # Errors
    /// Returns error if the entry is not in the catalog.
    pub fn get(&self, app_id: &AppId) -> Result<CatalogEntry> {
        let cache = self.entries.read().expect("acquire read lock on entries");

        cache
            .iter()
            .find(|e| &e.app_id == app_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound {
                app_id: app_id.to_string(),
            })
    }

    /// Get all entries in catalog order.
    #[must_use]
    pub fn get_all(&self) -> Vec<CatalogEntry> {
        let cache = self.entries.read().expect("acquire read lock on entries");
        cache.clone()
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let cache = self.entries.read().expect("acquire read lock on entries");
        cache.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new()
    }
}
