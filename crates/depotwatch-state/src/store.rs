//! The on-disk fingerprint store.
//!
//! One JSON file maps app IDs to their last observed fingerprint. The file
//! is read once on open and rewritten in full on flush; a temp-file-and-
//! rename dance keeps the previous snapshot intact if the process dies
//! mid-write.

use crate::error::{Result, StateError};
use chrono::{DateTime, Utc};
use depotwatch_core::{AppId, Fingerprint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One tracked entry: the fingerprint and when it was last updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEntry {
    /// Last observed fingerprint
    pub fingerprint: Fingerprint,
    /// When the fingerprint was recorded
    pub updated_at: DateTime<Utc>,
}

/// Serialized file shape, versioned for forward compatibility.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<AppId, TrackedEntry>,
}

const STATE_VERSION: u32 = 1;

/// Durable map of app ID to last observed fingerprint.
///
/// All mutation happens in memory; nothing reaches disk until [`flush`]
/// is called.
///
/// [`flush`]: TrackingStore::flush
#[derive(Debug)]
pub struct TrackingStore {
    path: PathBuf,
    entries: BTreeMap<AppId, TrackedEntry>,
    dirty: bool,
}

impl TrackingStore {
    /// Open the store at the given path.
    ///
    /// A missing file yields an empty store. A corrupt file is logged and
    /// treated as empty too: the next scan reseeds every entry, which beats
    /// refusing to start.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            match serde_json::from_str::<StateFile>(&contents) {
                Ok(file) => {
                    info!(
                        path = %path.display(),
                        entries = file.entries.len(),
                        "loaded tracking state"
                    );
                    file.entries
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "tracking state unreadable, starting empty"
                    );
                    BTreeMap::new()
                }
            }
        } else {
            info!(path = %path.display(), "no tracking state file, starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    /// Last observed fingerprint for an entry, if any.
    #[must_use]
    pub fn get(&self, app_id: &AppId) -> Option<&Fingerprint> {
        self.entries.get(app_id).map(|e| &e.fingerprint)
    }

    /// Record a fingerprint, returning whether it differed from the stored
    /// one. A first sighting counts as changed.
    pub fn insert(&mut self, app_id: AppId, fingerprint: Fingerprint) -> bool {
        let changed = self
            .entries
            .get(&app_id)
            .map_or(true, |prev| prev.fingerprint != fingerprint);

        if changed {
            self.entries.insert(
                app_id,
                TrackedEntry {
                    fingerprint,
                    updated_at: Utc::now(),
                },
            );
            self.dirty = true;
        }

        changed
    }

    /// Number of tracked entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether there are unflushed changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the current state to disk.
    ///
    /// The file is written to a temporary sibling first and renamed into
    /// place, so a crash mid-flush leaves the previous snapshot readable.
    /// A no-op when nothing changed since the last flush.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            debug!("tracking state clean, skipping flush");
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| StateError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = StateFile {
            version: STATE_VERSION,
            entries: self.entries.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        let tmp = self.tmp_path();
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        self.dirty = false;
        debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "flushed tracking state"
        );
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| "tracking_state.json".into(), ToOwned::to_owned);
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
