//! Request and response envelopes of the reality data API.

use reality_core::{ITwinId, RealityData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// `{"realityData": {...}}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityDataEnvelope {
    pub reality_data: RealityData,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<Link>,
}

/// `{"realityData": [...], "_links": {"next": {"href": ...}}}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityDataList {
    #[serde(default)]
    pub reality_data: Vec<RealityData>,
    #[serde(rename = "_links", default)]
    pub links: PageLinks,
}

/// Body of create and modify requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityDataPayload<'a> {
    #[serde(rename = "iTwinId", skip_serializing_if = "Option::is_none")]
    pub itwin_id: Option<ITwinId>,
    pub reality_data: &'a RealityData,
}

/// `{"container": {..., "_links": {"containerUrl": {"href": ...}}}}`
#[derive(Debug, Deserialize)]
pub struct ContainerEnvelope {
    pub container: ContainerDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDetails {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(rename = "_links")]
    pub links: ContainerLinks,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerLinks {
    pub container_url: Link,
}

/// `{"iTwins": ["...", ...]}`
#[derive(Debug, Deserialize)]
pub struct AssociatedITwins {
    #[serde(rename = "iTwins", default)]
    pub itwins: Vec<ITwinId>,
}
