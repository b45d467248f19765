//! Reality data bound to a client, with its own container URL cache.

use crate::client::RealityDataClient;
use crate::container::{compose_blob_url, CachedCredential, ContainerAccess};
use reality_core::{
    AccessMode, ITwinId, InvalidStateError, RealityData, RealityDataId, RealityResult,
};
use url::Url;

/// A reality data and the credentials obtained for its blob container.
///
/// The credential cache belongs to this instance alone. Cloning starts a new,
/// empty cache.
pub struct RealityDataEntity {
    metadata: RealityData,
    itwin_id: Option<ITwinId>,
    client: Option<RealityDataClient>,
    container_access: ContainerAccess,
}

impl RealityDataEntity {
    /// Wrap metadata without a client. Container operations fail with
    /// `InvalidStateError::MissingClient` until [`with_client`](Self::with_client).
    pub fn new(metadata: RealityData, itwin_id: Option<ITwinId>) -> Self {
        Self {
            metadata,
            itwin_id,
            client: None,
            container_access: ContainerAccess::new(),
        }
    }

    /// Bind to `client`. The cache is reset.
    pub fn with_client(mut self, client: RealityDataClient) -> Self {
        self.container_access = ContainerAccess::new();
        self.client = Some(client);
        self
    }

    pub fn id(&self) -> Option<RealityDataId> {
        self.metadata.id
    }

    pub fn itwin_id(&self) -> Option<ITwinId> {
        self.itwin_id
    }

    pub fn metadata(&self) -> &RealityData {
        &self.metadata
    }

    pub fn into_metadata(self) -> RealityData {
        self.metadata
    }

    pub fn is_bound(&self) -> bool {
        self.client.is_some()
    }

    /// Signed URL of the whole container for `access`.
    ///
    /// Served from the cache while fresh; otherwise requested from the
    /// platform and cached.
    pub async fn container_url(&self, access_token: &str, access: AccessMode) -> RealityResult<Url> {
        let client = self.client.as_ref().ok_or(InvalidStateError::MissingClient)?;
        self.container_access
            .resolve_container_url(
                client,
                access_token,
                self.metadata.id,
                self.itwin_id,
                access,
                client.now(),
            )
            .await
    }

    /// Signed URL of `relative_path` inside the container, or of the container
    /// itself when `relative_path` is `None`.
    ///
    /// # Errors
    /// * `InvalidStateError` - no identifier or no client
    /// * `ContainerResolutionError` - the container URL request failed
    /// * `ValidationError` - `relative_path` has a `.` or `..` segment
    pub async fn blob_url(
        &self,
        access_token: &str,
        relative_path: Option<&str>,
        access: AccessMode,
    ) -> RealityResult<Url> {
        let container_url = self.container_url(access_token, access).await?;
        compose_blob_url(&container_url, relative_path)
    }

    /// [`blob_url`](Self::blob_url) with a write flag; read access unless
    /// `write_access` is set.
    pub async fn signed_url(
        &self,
        access_token: &str,
        relative_path: Option<&str>,
        write_access: bool,
    ) -> RealityResult<Url> {
        self.blob_url(access_token, relative_path, AccessMode::from_write_flag(write_access))
            .await
    }

    /// Signed URL of the root document, or of the container if there is none.
    pub async fn root_document_url(&self, access_token: &str, access: AccessMode) -> RealityResult<Url> {
        self.blob_url(access_token, self.metadata.root_document.as_deref(), access)
            .await
    }

    /// The credential currently held for `access`, fresh or not.
    pub fn cached_credential(&self, access: AccessMode) -> Option<CachedCredential> {
        self.container_access.cache().get(access)
    }
}

impl Clone for RealityDataEntity {
    fn clone(&self) -> Self {
        Self {
            metadata: self.metadata.clone(),
            itwin_id: self.itwin_id,
            client: self.client.clone(),
            container_access: ContainerAccess::new(),
        }
    }
}

impl std::fmt::Debug for RealityDataEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealityDataEntity")
            .field("id", &self.metadata.id)
            .field("display_name", &self.metadata.display_name)
            .field("itwin_id", &self.itwin_id)
            .field("bound", &self.client.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockTransport;
    use reality_core::{ClientConfig, RealityError};
    use serde_json::json;
    use std::sync::Arc;
    use uuid::Uuid;

    fn bound(data: RealityData, transport: &Arc<MockTransport>) -> RealityDataEntity {
        let client = RealityDataClient::with_transport(ClientConfig::new(), transport.clone()).unwrap();
        RealityDataEntity::new(data, None).with_client(client)
    }

    fn container(href: &str) -> serde_json::Value {
        json!({"container": {"_links": {"containerUrl": {"href": href}}}})
    }

    #[tokio::test]
    async fn test_unbound_entity_fails_with_missing_client() {
        let mut data = RealityData::new("a", "LAS");
        data.id = Some(Uuid::new_v4());
        let entity = RealityDataEntity::new(data, None);

        let err = entity.blob_url("tok", None, AccessMode::Read).await.unwrap_err();
        assert!(matches!(
            err,
            RealityError::InvalidState(InvalidStateError::MissingClient)
        ));
    }

    #[tokio::test]
    async fn test_root_document_url() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, container("https://host/container?sig=abc123"));
        let mut data = RealityData::new("tiles", "Cesium3DTiles");
        data.id = Some(Uuid::new_v4());
        data.root_document = Some("tileset.json".to_string());
        let entity = bound(data, &transport);

        let url = entity.root_document_url("tok", AccessMode::Read).await.unwrap();
        assert_eq!(url.as_str(), "https://host/container/tileset.json?sig=abc123");
    }

    #[tokio::test]
    async fn test_write_flag_selects_slot() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, container("https://host/c?sp=r&sig=1"));
        transport.push_json(200, container("https://host/c?sp=rw&sig=2"));
        let mut data = RealityData::new("a", "LAS");
        data.id = Some(Uuid::new_v4());
        let entity = bound(data, &transport);

        let read = entity.signed_url("tok", Some("a.las"), false).await.unwrap();
        assert_eq!(read.as_str(), "https://host/c/a.las?sp=r&sig=1");
        assert_eq!(
            transport.last_request().unwrap().query_param("permissions").as_deref(),
            Some("Read")
        );

        let write = entity.signed_url("tok", Some("a.las"), true).await.unwrap();
        assert_eq!(write.as_str(), "https://host/c/a.las?sp=rw&sig=2");
        assert_eq!(
            transport.last_request().unwrap().query_param("permissions").as_deref(),
            Some("Write")
        );
        assert!(entity.cached_credential(AccessMode::Read).is_some());
        assert!(entity.cached_credential(AccessMode::Write).is_some());

        entity.signed_url("tok", None, false).await.unwrap();
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_clone_starts_with_empty_cache() {
        let transport = Arc::new(MockTransport::new());
        transport.push_json(200, container("https://host/c?sig=1"));
        transport.push_json(200, container("https://host/c?sig=2"));
        let mut data = RealityData::new("a", "LAS");
        data.id = Some(Uuid::new_v4());
        let entity = bound(data, &transport);

        entity.container_url("tok", AccessMode::Read).await.unwrap();
        let copy = entity.clone();
        assert!(copy.cached_credential(AccessMode::Read).is_none());
        assert!(entity.cached_credential(AccessMode::Read).is_some());

        let url = copy.container_url("tok", AccessMode::Read).await.unwrap();
        assert_eq!(url.query(), Some("sig=2"));
        assert_eq!(transport.call_count(), 2);
    }

    #[test]
    fn test_debug_omits_client_details() {
        let entity = RealityDataEntity::new(RealityData::new("Scan", "LAS"), None);
        let debug = format!("{:?}", entity);
        assert!(debug.contains("Scan"));
        assert!(debug.contains("bound: false"));
    }
}
