//! HTTP transport seam.
//!
//! The client never talks to `reqwest` directly; every call goes through a
//! [`Transport`] so tests can substitute [`crate::MockTransport`].

use crate::wire::ErrorBody;
use async_trait::async_trait;
use reality_core::{ApiError, ClientConfig, RealityResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use url::{Position, Url};

/// A single API call.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    /// Bearer token supplied by the caller's authorizer.
    pub access_token: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: Url, access_token: impl Into<String>) -> Self {
        Self {
            method,
            url,
            access_token: access_token.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: Url, access_token: impl Into<String>) -> Self {
        Self::new(Method::GET, url, access_token)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("access_token", &"[REDACTED]")
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Status and decoded body of an API response.
///
/// Empty bodies decode to `Value::Null`; bodies that are not JSON are kept
/// as `Value::String`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Human-readable message of an error response.
    pub fn error_message(&self) -> String {
        match serde_json::from_value::<ErrorBody>(self.body.clone()) {
            Ok(parsed) => parsed.error.message,
            Err(_) => match &self.body {
                Value::Null => format!("HTTP {}", self.status),
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        }
    }

    /// Body of a successful response, or `ApiError::RequestFailed`.
    pub fn into_result(self) -> Result<Value, ApiError> {
        if self.is_success() {
            return Ok(self.body);
        }
        let code = serde_json::from_value::<ErrorBody>(self.body.clone())
            .ok()
            .and_then(|parsed| parsed.error.code);
        Err(ApiError::RequestFailed {
            status: self.status,
            code,
            message: self.error_message(),
        })
    }
}

/// Performs authenticated HTTP calls against the platform.
/// Implementations must be thread-safe (Send + Sync).
///
/// Any HTTP status is returned as an [`ApiResponse`]; only failures to
/// obtain a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> RealityResult<ApiResponse>;
}

/// `Transport` backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    accept: String,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> RealityResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport {
                reason: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            accept: config.accept.clone(),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> RealityResult<ApiResponse> {
        tracing::debug!(
            method = %request.method,
            url = without_query(&request.url),
            "sending request"
        );

        let mut builder = self
            .client
            .request(request.method, request.url)
            .bearer_auth(&request.access_token)
            .header(ACCEPT, &self.accept);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            reason: format!("HTTP request failed: {}", e),
        })?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| ApiError::Transport {
            reason: format!("Failed to read response body: {}", e),
        })?;

        Ok(ApiResponse::new(status, decode_body(text)))
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("accept", &self.accept)
            .finish()
    }
}

fn decode_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

/// The URL up to and including its path; query strings may carry signatures.
pub(crate) fn without_query(url: &Url) -> &str {
    &url[..Position::AfterPath]
}
