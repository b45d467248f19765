//! Reality data API client.

use crate::container::ContainerFetcher;
use crate::entity::RealityDataEntity;
use crate::transport::{without_query, ApiRequest, ApiResponse, ReqwestTransport, Transport};
use crate::wire::{
    AssociatedITwins, ContainerEnvelope, RealityDataEnvelope, RealityDataList, RealityDataPayload,
};
use async_trait::async_trait;
use reality_core::{
    AccessMode, ApiError, ClientConfig, Clock, ContainerResolutionError, ITwinId, ListQuery,
    Page, RealityData, RealityDataId, RealityError, RealityResult, SystemClock, Timestamp,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Client for the reality data endpoint.
///
/// Cheap to clone; clones share the transport and clock. Every operation
/// takes the caller's bearer token explicitly.
#[derive(Clone)]
pub struct RealityDataClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl RealityDataClient {
    /// Create a client that talks HTTP through `reqwest`.
    pub fn new(config: ClientConfig) -> RealityResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            transport: Arc::new(transport),
            clock: Arc::new(SystemClock),
        })
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> RealityResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the time source used for container URL freshness.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ------------------------------------------------------------------------
    // Reality data CRUD
    // ------------------------------------------------------------------------

    /// Fetch one reality data, bound to this client.
    pub async fn get_reality_data(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: Option<ITwinId>,
    ) -> RealityResult<RealityDataEntity> {
        let mut url = self.endpoint(&[&reality_data_id.to_string()])?;
        if let Some(itwin_id) = itwin_id {
            url.query_pairs_mut()
                .append_pair("iTwinId", &itwin_id.to_string());
        }
        let body = self
            .send(ApiRequest::get(url, access_token).with_header("Prefer", "return=representation"))
            .await?;
        let envelope: RealityDataEnvelope = decode(body)?;
        Ok(self.bind(envelope.reality_data, itwin_id))
    }

    /// Fetch one page of reality data.
    pub async fn list_reality_data(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> RealityResult<Page<RealityData>> {
        query.validate()?;
        let url = self.list_url(query)?;
        let body = self
            .send(ApiRequest::get(url, access_token).with_header("Prefer", "return=representation"))
            .await?;
        let list: RealityDataList = decode(body)?;
        let continuation_token = match list.links.next {
            Some(next) => continuation_token(&next.href)?,
            None => None,
        };
        Ok(Page {
            items: list.reality_data,
            continuation_token,
        })
    }

    /// Fetch every page of a list query.
    pub async fn list_all_reality_data(
        &self,
        access_token: &str,
        query: &ListQuery,
    ) -> RealityResult<Vec<RealityData>> {
        let mut query = query.clone();
        let mut items = Vec::new();
        loop {
            let page = self.list_reality_data(access_token, &query).await?;
            items.extend(page.items);
            match page.continuation_token {
                Some(token) => query.continuation_token = Some(token),
                None => return Ok(items),
            }
        }
    }

    /// Register new reality data in `itwin_id`. Any `id` on `data` is ignored.
    pub async fn create_reality_data(
        &self,
        access_token: &str,
        itwin_id: ITwinId,
        data: &RealityData,
    ) -> RealityResult<RealityDataEntity> {
        data.validate_for_create()?;
        let mut payload_data = data.clone();
        payload_data.id = None;

        let body = payload(Some(itwin_id), &payload_data)?;
        let url = self.endpoint(&[""])?;
        let body = self
            .send(ApiRequest::new(Method::POST, url, access_token).with_body(body))
            .await?;
        let envelope: RealityDataEnvelope = decode(body)?;
        tracing::debug!(reality_data_id = ?envelope.reality_data.id, %itwin_id, "created reality data");
        Ok(self.bind(envelope.reality_data, Some(itwin_id)))
    }

    /// Update the metadata of an existing reality data; `data.id` selects it.
    pub async fn modify_reality_data(
        &self,
        access_token: &str,
        itwin_id: Option<ITwinId>,
        data: &RealityData,
    ) -> RealityResult<RealityDataEntity> {
        let reality_data_id = data.require_id()?;
        data.validate_for_modify()?;
        let mut payload_data = data.clone();
        payload_data.id = None;

        let body = payload(itwin_id, &payload_data)?;
        let url = self.endpoint(&[&reality_data_id.to_string()])?;
        let body = self
            .send(ApiRequest::new(Method::PATCH, url, access_token).with_body(body))
            .await?;
        let envelope: RealityDataEnvelope = decode(body)?;
        Ok(self.bind(envelope.reality_data, itwin_id))
    }

    pub async fn delete_reality_data(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
    ) -> RealityResult<()> {
        let url = self.endpoint(&[&reality_data_id.to_string()])?;
        self.send(ApiRequest::new(Method::DELETE, url, access_token))
            .await?;
        tracing::debug!(%reality_data_id, "deleted reality data");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // iTwin associations
    // ------------------------------------------------------------------------

    pub async fn associate_itwin(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: ITwinId,
    ) -> RealityResult<()> {
        let url = self.endpoint(&[
            &reality_data_id.to_string(),
            "itwins",
            &itwin_id.to_string(),
        ])?;
        self.send(ApiRequest::new(Method::PUT, url, access_token))
            .await?;
        Ok(())
    }

    pub async fn dissociate_itwin(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: ITwinId,
    ) -> RealityResult<()> {
        let url = self.endpoint(&[
            &reality_data_id.to_string(),
            "itwins",
            &itwin_id.to_string(),
        ])?;
        self.send(ApiRequest::new(Method::DELETE, url, access_token))
            .await?;
        Ok(())
    }

    pub async fn list_associated_itwins(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
    ) -> RealityResult<Vec<ITwinId>> {
        let url = self.endpoint(&[&reality_data_id.to_string(), "itwins"])?;
        let body = self.send(ApiRequest::get(url, access_token)).await?;
        let itwins: AssociatedITwins = decode(body)?;
        Ok(itwins.itwins)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Wrap metadata in an entity bound to this client.
    pub fn bind(&self, data: RealityData, itwin_id: Option<ITwinId>) -> RealityDataEntity {
        RealityDataEntity::new(data, itwin_id).with_client(self.clone())
    }

    /// `{base_url}/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> RealityResult<Url> {
        let mut raw = self.config.base_url.clone();
        for segment in segments {
            raw.push('/');
            raw.push_str(segment);
        }
        Ok(Url::parse(&raw)?)
    }

    fn list_url(&self, query: &ListQuery) -> RealityResult<Url> {
        let mut url = self.endpoint(&[""])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(itwin_id) = query.itwin_id {
                pairs.append_pair("iTwinId", &itwin_id.to_string());
            }
            let top = query.top.unwrap_or(self.config.page_size);
            pairs.append_pair("$top", &top.to_string());
            if let Some(token) = &query.continuation_token {
                pairs.append_pair("continuationToken", token);
            }
            if let Some(extent) = &query.extent {
                pairs.append_pair("extent", &extent.to_query_param());
            }
            if !query.types.is_empty() {
                pairs.append_pair("types", &query.types.join(","));
            }
        }
        Ok(url)
    }

    fn container_url_request(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: Option<ITwinId>,
        access: AccessMode,
    ) -> RealityResult<ApiRequest> {
        let mut url = self.endpoint(&[&reality_data_id.to_string(), "container", ""])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(itwin_id) = itwin_id {
                pairs.append_pair("projectId", &itwin_id.to_string());
            }
            pairs.append_pair("permissions", access.permission());
        }
        Ok(ApiRequest::get(url, access_token))
    }

    async fn send(&self, request: ApiRequest) -> RealityResult<Value> {
        let method = request.method.clone();
        let target = without_query(&request.url).to_string();
        let response = self.transport.execute(request).await.map_err(|err| {
            tracing::warn!(%method, url = %target, error = %err, "request failed");
            err
        })?;
        response.into_result().map_err(|err| {
            tracing::warn!(%method, url = %target, error = %err, "request rejected");
            RealityError::from(err)
        })
    }
}

#[async_trait]
impl ContainerFetcher for RealityDataClient {
    /// `GET {base}/{id}/container/?projectId=&permissions=` and extract
    /// `container._links.containerUrl.href`. Never cached here.
    async fn fetch_container_url(
        &self,
        access_token: &str,
        reality_data_id: RealityDataId,
        itwin_id: Option<ITwinId>,
        access: AccessMode,
    ) -> RealityResult<Url> {
        let failed = |status: Option<u16>, message: String| -> RealityError {
            ContainerResolutionError {
                reality_data_id,
                access,
                status,
                message,
            }
            .into()
        };

        let request = self.container_url_request(access_token, reality_data_id, itwin_id, access)?;
        let response: ApiResponse = self
            .transport
            .execute(request)
            .await
            .map_err(|err| failed(err.status(), err.to_string()))?;

        let status = response.status;
        if !response.is_success() {
            return Err(failed(Some(status), response.error_message()));
        }

        let envelope: ContainerEnvelope = serde_json::from_value(response.body)
            .map_err(|e| failed(Some(status), format!("Response has no container URL: {}", e)))?;
        if let Some(granted) = &envelope.container.access {
            if granted != access.permission() {
                tracing::debug!(%reality_data_id, requested = %access, %granted, "container access differs from request");
            }
        }
        Url::parse(&envelope.container.links.container_url.href)
            .map_err(|e| failed(Some(status), format!("Invalid container URL: {}", e)))
    }
}

impl std::fmt::Debug for RealityDataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealityDataClient")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

fn payload(itwin_id: Option<ITwinId>, data: &RealityData) -> RealityResult<Value> {
    serde_json::to_value(RealityDataPayload {
        itwin_id,
        reality_data: data,
    })
    .map_err(|e| {
        ApiError::InvalidResponse {
            reason: format!("Failed to serialize request: {}", e),
        }
        .into()
    })
}

fn decode<T: DeserializeOwned>(body: Value) -> RealityResult<T> {
    serde_json::from_value(body).map_err(|e| {
        ApiError::InvalidResponse {
            reason: format!("Failed to parse response: {}", e),
        }
        .into()
    })
}

/// `continuationToken` query parameter of a `_links.next.href`.
fn continuation_token(next_href: &str) -> RealityResult<Option<String>> {
    let next = Url::parse(next_href).map_err(|e| ApiError::InvalidResponse {
        reason: format!("Invalid next link {}: {}", next_href, e),
    })?;
    Ok(next
        .query_pairs()
        .find(|(key, _)| key == "continuationToken")
        .map(|(_, value)| value.into_owned()))
}

// ============================================================================
// UNIT TESTS
// ============================================================================
