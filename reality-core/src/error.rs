//! Error types for reality data operations

use crate::{AccessMode, RealityDataId};
use thiserror::Error;

/// Required identifiers are missing at call time.
///
/// These are raised before any request is issued and are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidStateError {
    #[error("Reality data has no identifier")]
    MissingRealityDataId,

    #[error("Reality data is not bound to a client")]
    MissingClient,
}

/// The container URL request failed.
///
/// Bad status, transport failure and a response without the container link
/// all fold into this one error. `status` is set only when the platform
/// answered with an HTTP status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Container URL resolution failed for reality data {reality_data_id} ({access} access): {message}")]
pub struct ContainerResolutionError {
    pub reality_data_id: RealityDataId,
    pub access: AccessMode,
    pub status: Option<u16>,
    pub message: String,
}

/// Errors from the metadata API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request failed with status {status}: {message}")]
    RequestFailed {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },
}

/// Client-side validation errors, raised before a payload is sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config TOML: {reason}")]
    Parse { reason: String },
}

/// Master error type for all reality data errors.
#[derive(Debug, Clone, Error)]
pub enum RealityError {
    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),

    #[error(transparent)]
    ContainerResolution(#[from] ContainerResolutionError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl RealityError {
    /// Upstream HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ContainerResolution(err) => err.status,
            Self::Api(ApiError::RequestFailed { status, .. }) => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for reality data operations.
pub type RealityResult<T> = Result<T, RealityError>;

// =============================================================================
// TESTS
// =============================================================================
