//! Catalog entry type and its on-disk representation.

use depotwatch_core::AppId;
use serde::{Deserialize, Serialize};

/// One tracked title, immutable for the duration of a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque catalog identity
    pub app_id: AppId,
    /// Human-readable title name
    pub name: String,
    /// Known supplemental-content count; sizes synthetic fallback snapshots
    pub dlc_count: u32,
}

/// Raw JSON shape of a catalog record. App ids appear both as numbers and
/// strings in catalog files maintained by the external tooling.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCatalogEntry {
    pub name: String,
    pub app_id: NumberOrString,
    #[serde(default)]
    pub dlc_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    pub(crate) fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::String(s) => s,
        }
    }
}
