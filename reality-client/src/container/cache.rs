//! Two-slot credential cache, one slot per access mode.

use chrono::Duration;
use reality_core::{AccessMode, Timestamp, FRESHNESS_WINDOW_SECS};
use std::sync::RwLock;
use url::Url;

/// The fixed 50-minute freshness window.
pub fn freshness_window() -> Duration {
    Duration::seconds(FRESHNESS_WINDOW_SECS as i64)
}

/// A signed container URL and the instant it was obtained.
///
/// Never mutated in place; a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    container_url: Url,
    obtained_at: Timestamp,
}

impl CachedCredential {
    pub fn new(container_url: Url, obtained_at: Timestamp) -> Self {
        Self {
            container_url,
            obtained_at,
        }
    }

    pub fn container_url(&self) -> &Url {
        &self.container_url
    }

    pub fn obtained_at(&self) -> Timestamp {
        self.obtained_at
    }

    pub fn age(&self, now: Timestamp) -> Duration {
        now - self.obtained_at
    }

    /// Valid iff `now - obtained_at < FRESHNESS_WINDOW_SECS`.
    pub fn is_fresh(&self, now: Timestamp) -> bool {
        self.age(now) < freshness_window()
    }
}

/// The freshness check used for every cache lookup.
pub fn is_fresh(credential: &CachedCredential, now: Timestamp) -> bool {
    credential.is_fresh(now)
}

/// Holds the last container URL obtained for each access mode.
///
/// Owned by exactly one reality data entity and never shared.
#[derive(Debug, Default)]
pub struct CredentialCache {
    read: RwLock<Option<CachedCredential>>,
    write: RwLock<Option<CachedCredential>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, access: AccessMode) -> &RwLock<Option<CachedCredential>> {
        match access {
            AccessMode::Read => &self.read,
            AccessMode::Write => &self.write,
        }
    }

    /// Pure lookup; freshness is the caller's concern.
    pub fn get(&self, access: AccessMode) -> Option<CachedCredential> {
        match self.slot(access).read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Unconditionally replace the slot for `access`.
    pub fn put(&self, access: AccessMode, credential: CachedCredential) {
        let mut slot = match self.slot(access).write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(credential);
    }

    /// The cached URL for `access` if it is still fresh at `now`.
    pub fn fresh_url(&self, access: AccessMode, now: Timestamp) -> Option<Url> {
        self.get(access)
            .filter(|credential| is_fresh(credential, now))
            .map(|credential| credential.container_url)
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
