//! Rotating client identities for upstream requests.
//!
//! Upstream sources correlate and block repeated identical clients, so each
//! request borrows the next identity from a fixed round-robin pool.

use std::sync::atomic::{AtomicUsize, Ordering};

/// One pre-defined header/user-agent bundle.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// User-Agent header value
    pub user_agent: &'static str,
    /// Accept-Language header value
    pub accept_language: &'static str,
}

/// Common desktop browser identities.
const IDENTITY_POOL: &[ClientIdentity] = &[
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
        accept_language: "en-US,en;q=0.5",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/131.0.0.0",
        accept_language: "en-US,en;q=0.8",
    },
    ClientIdentity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
        accept_language: "en-US,en;q=0.9",
    },
];

/// Stateless round-robin over the identity pool.
///
/// Shared by all sources in a chain; the only state is the rotation counter.
#[derive(Debug, Default)]
pub struct SessionRotator {
    counter: AtomicUsize,
}

impl SessionRotator {
    /// Create a rotator starting at the first identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next identity in rotation.
    pub fn next(&self) -> &'static ClientIdentity {
        let idx = self.counter.fetch_add(1, Ordering::Relaxed) % IDENTITY_POOL.len();
        &IDENTITY_POOL[idx]
    }

    /// Pool size.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        IDENTITY_POOL.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycles_through_pool() {
        let rotator = SessionRotator::new();
        let first = rotator.next().user_agent;

        // Advance through the rest of the pool; next() must come back around
        for _ in 1..rotator.pool_size() {
            rotator.next();
        }
        assert_eq!(rotator.next().user_agent, first);
    }

    #[test]
    fn test_consecutive_identities_differ() {
        let rotator = SessionRotator::new();
        let a = rotator.next().user_agent;
        let b = rotator.next().user_agent;
        assert_ne!(a, b);
    }
}
