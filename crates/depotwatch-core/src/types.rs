//! Shared domain types used across the depotwatch service.
//!
//! This module defines the data model flowing through the pipeline:
//! catalog identities, resolved manifest snapshots, and the fingerprints
//! used for change detection.

use crate::error::CoreError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype for catalog application identifiers with validation.
///
/// App IDs are opaque numeric identifiers, 1-10 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(String);

impl AppId {
    /// Create a new `AppId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not 1-10 ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), CoreError> {
        static APP_ID_REGEX: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^[0-9]{1,10}$").expect("valid regex"));

        if APP_ID_REGEX.is_match(id) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "invalid app ID: must be 1-10 digits, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One independently-versioned component of a title's content.
///
/// `version_token` is an opaque, source-provided string (build ID, manifest
/// gid, or generated token for synthetic results). It is compared, never
/// parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepotEntry {
    /// Depot identifier as reported by the source
    pub depot_id: String,
    /// Opaque version token for this depot
    pub version_token: String,
    /// Whether this depot carries supplemental content (DLC etc.)
    pub supplemental: bool,
}

impl DepotEntry {
    /// Create a base-content depot entry.
    #[must_use]
    pub fn base(depot_id: impl Into<String>, version_token: impl Into<String>) -> Self {
        Self {
            depot_id: depot_id.into(),
            version_token: version_token.into(),
            supplemental: false,
        }
    }

    /// Create a supplemental-content depot entry.
    #[must_use]
    pub fn supplemental(depot_id: impl Into<String>, version_token: impl Into<String>) -> Self {
        Self {
            depot_id: depot_id.into(),
            version_token: version_token.into(),
            supplemental: true,
        }
    }
}

/// Which source in the resolver cascade produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedVia {
    /// Structured build/branch API (first in the cascade)
    PrimaryApi,
    /// Structured depot-info API (second in the cascade)
    SecondaryApi,
    /// Regex-mined community page (expensive, skippable)
    CommunityScrape,
    /// Manufactured terminal fallback; never authoritative
    Synthetic,
}

impl ResolvedVia {
    /// Short label used in logs and notification payloads.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrimaryApi => "primary-api",
            Self::SecondaryApi => "secondary-api",
            Self::CommunityScrape => "community-scrape",
            Self::Synthetic => "synthetic",
        }
    }
}

impl fmt::Display for ResolvedVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The result of resolving one catalog entry: the current depot list and
/// where it came from.
///
/// Snapshots are never persisted verbatim; they are reduced to a
/// [`Fingerprint`] for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestSnapshot {
    /// Identity of the resolved catalog entry
    pub app_id: AppId,
    /// Depot entries in source order
    pub depots: Vec<DepotEntry>,
    /// Source that produced this snapshot
    pub resolved_via: ResolvedVia,
    /// When the resolution completed
    pub resolved_at: DateTime<Utc>,
}

impl ManifestSnapshot {
    /// Create a snapshot resolved at the current moment.
    #[must_use]
    pub fn new(app_id: AppId, depots: Vec<DepotEntry>, resolved_via: ResolvedVia) -> Self {
        Self {
            app_id,
            depots,
            resolved_via,
            resolved_at: Utc::now(),
        }
    }

    /// Whether the snapshot was manufactured rather than observed upstream.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.resolved_via == ResolvedVia::Synthetic
    }

    /// Count of supplemental depots in this snapshot.
    #[must_use]
    pub fn supplemental_count(&self) -> usize {
        self.depots.iter().filter(|d| d.supplemental).count()
    }
}

/// A comparable digest of all depot version tokens for a title at one point
/// in time.
///
/// The fingerprint is the canonical JSON serialization of the sorted token
/// list, so two snapshots with equal token sets compare equal regardless of
/// depot order or which source produced them. Used purely for equality
/// testing, not for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint of a snapshot.
    #[must_use]
    pub fn of(snapshot: &ManifestSnapshot) -> Self {
        let mut tokens: Vec<&str> = snapshot
            .depots
            .iter()
            .map(|d| d.version_token.as_str())
            .collect();
        tokens.sort_unstable();

        // Token lists are plain strings; serialization cannot fail.
        let canonical =
            serde_json::to_string(&tokens).expect("serialize sorted token list");
        Self(canonical)
    }

    /// Get the canonical serialized form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A shortened form for logs and notification summaries.
    #[must_use]
    pub fn abbrev(&self) -> String {
        const MAX_BYTES: usize = 40;

        if self.0.len() <= MAX_BYTES {
            return self.0.clone();
        }

        // Tokens are arbitrary upstream strings; cut at a char boundary
        let mut cut = MAX_BYTES;
        while !self.0.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…", &self.0[..cut])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A detected change waiting to be delivered to the notification sink.
///
/// Created by the scan orchestrator; ownership transfers fully to the
/// delivery queue on enqueue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingNotification {
    /// Display name of the title
    pub name: String,
    /// Identity of the changed entry
    pub app_id: AppId,
    /// The snapshot that triggered the notification
    pub snapshot: ManifestSnapshot,
    /// Fingerprint recorded before this change; `None` on first sighting
    pub previous: Option<Fingerprint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_id_valid() {
        for id in ["1", "440", "2358720", "4294967295"] {
            assert!(AppId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_app_id_invalid() {
        for id in ["", "abc", "44a0", "-440", "12345678901"] {
            assert!(AppId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_app_id_display() {
        let id = AppId::new("440").expect("valid app ID");
        assert_eq!(id.to_string(), "440");
        assert_eq!(id.as_str(), "440");
    }

    #[test]
    fn test_fingerprint_ignores_depot_order() {
        let app_id = AppId::new("440").expect("valid app ID");
        let a = ManifestSnapshot::new(
            app_id.clone(),
            vec![DepotEntry::base("441", "111"), DepotEntry::base("442", "222")],
            ResolvedVia::PrimaryApi,
        );
        let b = ManifestSnapshot::new(
            app_id,
            vec![DepotEntry::base("442", "222"), DepotEntry::base("441", "111")],
            ResolvedVia::SecondaryApi,
        );

        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_fingerprint_ignores_resolved_via() {
        let app_id = AppId::new("440").expect("valid app ID");
        let depots = vec![DepotEntry::base("441", "8574203319")];
        let api = ManifestSnapshot::new(app_id.clone(), depots.clone(), ResolvedVia::PrimaryApi);
        let scrape = ManifestSnapshot::new(app_id, depots, ResolvedVia::CommunityScrape);

        assert_eq!(Fingerprint::of(&api), Fingerprint::of(&scrape));
    }

    #[test]
    fn test_fingerprint_detects_token_change() {
        let app_id = AppId::new("440").expect("valid app ID");
        let old = ManifestSnapshot::new(
            app_id.clone(),
            vec![DepotEntry::base("441", "111")],
            ResolvedVia::PrimaryApi,
        );
        let new = ManifestSnapshot::new(
            app_id,
            vec![DepotEntry::base("441", "112")],
            ResolvedVia::PrimaryApi,
        );

        assert_ne!(Fingerprint::of(&old), Fingerprint::of(&new));
    }

    #[test]
    fn test_supplemental_count() {
        let app_id = AppId::new("440").expect("valid app ID");
        let snapshot = ManifestSnapshot::new(
            app_id,
            vec![
                DepotEntry::base("441", "111"),
                DepotEntry::supplemental("dlc_1", "222"),
                DepotEntry::supplemental("dlc_2", "333"),
            ],
            ResolvedVia::SecondaryApi,
        );
        assert_eq!(snapshot.supplemental_count(), 2);
        assert!(!snapshot.is_synthetic());
    }

    #[test]
    fn test_abbrev_short_fingerprint_unchanged() {
        let app_id = AppId::new("440").expect("valid app ID");
        let snapshot = ManifestSnapshot::new(
            app_id,
            vec![DepotEntry::base("441", "111")],
            ResolvedVia::PrimaryApi,
        );
        let fp = Fingerprint::of(&snapshot);
        assert_eq!(fp.abbrev(), fp.as_str());
    }

    #[test]
    fn test_abbrev_truncates_multibyte_tokens_safely() {
        let app_id = AppId::new("440").expect("valid app ID");
        // Positions the multibyte text across the truncation point
        let token = format!("{}ビルド20250830", "a".repeat(37));
        let snapshot = ManifestSnapshot::new(
            app_id,
            vec![DepotEntry::base("441", token)],
            ResolvedVia::SecondaryApi,
        );
        let fp = Fingerprint::of(&snapshot);

        let short = fp.abbrev();
        assert!(short.ends_with('…'));
        let prefix = &short[..short.len() - '…'.len_utf8()];
        assert!(fp.as_str().starts_with(prefix));
        assert!(prefix.len() <= 40);
    }

    #[test]
    fn test_fingerprint_serialization_round_trip() {
        let app_id = AppId::new("440").expect("valid app ID");
        let snapshot = ManifestSnapshot::new(
            app_id,
            vec![DepotEntry::base("441", "111")],
            ResolvedVia::PrimaryApi,
        );
        let fp = Fingerprint::of(&snapshot);
        let json = serde_json::to_string(&fp).expect("serialize fingerprint");
        let back: Fingerprint = serde_json::from_str(&json).expect("deserialize fingerprint");
        assert_eq!(fp, back);
    }
}
