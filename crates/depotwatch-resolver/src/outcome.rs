//! Tagged result of a single source attempt.

use depotwatch_core::DepotEntry;
use std::time::Duration;

/// What one source attempt produced.
///
/// The chain dispatches on this instead of on error shapes: `Found`
/// short-circuits, `Empty` and `Failed` fall through to the next source,
/// `RateLimited` triggers bounded backoff within the same source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The source produced depot data
    Found(Vec<DepotEntry>),
    /// The source answered but has no data for this entry (not an error)
    Empty,
    /// The source is throttling us; retry after backing off
    RateLimited {
        /// Server-provided hint, when present
        retry_after: Option<Duration>,
    },
    /// Transient failure (timeout, 5xx, malformed payload)
    Failed(String),
}

impl FetchOutcome {
    /// Whether this outcome carries usable depot data.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(depots) if !depots.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_found() {
        assert!(FetchOutcome::Found(vec![DepotEntry::base("441", "1")]).is_found());
        assert!(!FetchOutcome::Found(vec![]).is_found());
        assert!(!FetchOutcome::Empty.is_found());
        assert!(!FetchOutcome::RateLimited { retry_after: None }.is_found());
        assert!(!FetchOutcome::Failed("boom".to_string()).is_found());
    }
}
