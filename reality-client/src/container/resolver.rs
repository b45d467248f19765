//! Container URL resolution: cache lookup, platform request, cache update.

use super::cache::{CachedCredential, CredentialCache};
use async_trait::async_trait;
use reality_core::{
    AccessMode, ContainerResolutionError, ITwinId, InvalidStateError, RealityDataId,
    RealityError, RealityResult, Timestamp,
};
use tokio::sync::Mutex;
use url::Url;

/// Performs the authenticated container URL request.
///
/// Implementations never cache; [`ContainerAccess`] owns caching.
#[async_trait]
pub trait ContainerFetcher: Send + Sync {
    async fn fetch_container_url(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: Option<ITwinId>,
        access: AccessMode,
    ) -> RealityResult<Url>;
}

/// Credential cache plus one single-flight gate per access mode.
///
/// Fresh hits never touch the gates, so a caller holding a fresh URL never
/// waits on network I/O. Misses for the same mode are collapsed: the first
/// caller fetches while the others wait on the gate and then re-check the
/// slot. Read and Write never share a gate.
#[derive(Debug, Default)]
pub struct ContainerAccess {
    cache: CredentialCache,
    read_gate: Mutex<()>,
    write_gate: Mutex<()>,
}

impl ContainerAccess {
    pub fn new() -> Self {
        Self {
            cache: CredentialCache::new(),
            read_gate: Mutex::new(()),
            write_gate: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    fn gate(&self, access: AccessMode) -> &Mutex<()> {
        match access {
            AccessMode::Read => &self.read_gate,
            AccessMode::Write => &self.write_gate,
        }
    }

    /// Return a fresh container URL for `access`, requesting one if needed.
    ///
    /// # Errors
    /// * `InvalidStateError::MissingRealityDataId` - before any request when
    ///   `reality_data_id` is `None`
    /// * `ContainerResolutionError` - the request failed; the cache slot is
    ///   left untouched
    pub async fn resolve_container_url(
        &self,
        fetcher: &dyn ContainerFetcher,
        access_token: &str,
        reality_data_id: Option<RealityDataId>,
        itwin_id: Option<ITwinId>,
        access: AccessMode,
        now: Timestamp,
    ) -> RealityResult<Url> {
        let reality_data_id = reality_data_id.ok_or(InvalidStateError::MissingRealityDataId)?;

        if let Some(url) = self.cache.fresh_url(access, now) {
            tracing::debug!(%reality_data_id, %access, "container URL cache hit");
            return Ok(url);
        }

        let _gate = self.gate(access).lock().await;

        // Another caller may have refreshed the slot while we waited.
        if let Some(url) = self.cache.fresh_url(access, now) {
            tracing::debug!(%reality_data_id, %access, "container URL refreshed by concurrent caller");
            return Ok(url);
        }

        tracing::debug!(
            %reality_data_id,
            %access,
            stale = self.cache.get(access).is_some(),
            "requesting container URL"
        );

        let container_url = fetcher
            .fetch_container_url(access_token, reality_data_id, itwin_id, access)
            .await
            .map_err(|err| into_resolution_error(err, reality_data_id, access))?;

        self.cache
            .put(access, CachedCredential::new(container_url.clone(), now));
        Ok(container_url)
    }
}

fn into_resolution_error(
    err: RealityError,
    reality_data_id: RealityDataId,
    access: AccessMode,
) -> RealityError {
    let err = match err {
        RealityError::ContainerResolution(_) | RealityError::InvalidState(_) => err,
        other => ContainerResolutionError {
            reality_data_id,
            access,
            status: other.status(),
            message: other.to_string(),
        }
        .into(),
    };
    tracing::warn!(%reality_data_id, %access, error = %err, "container URL resolution failed");
    err
}

// ============================================================================
// UNIT TESTS
// ============================================================================
