//! Reality Data Core - Entity Types
//!
//! Pure data structures describing reality data (point clouds, meshes,
//! tilesets) registered against iTwins. No I/O lives here; the HTTP
//! surface is in `reality-client`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod clock;
pub mod config;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use error::{
    ApiError, ConfigError, ContainerResolutionError, InvalidStateError, RealityError,
    RealityResult, ValidationError,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Reality data identifier.
pub type RealityDataId = Uuid;

/// iTwin (project) identifier.
pub type ITwinId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// CONTAINER CREDENTIALS
// ============================================================================

/// Lifetime of the access signatures issued by the platform: 60 minutes.
pub const SIGNATURE_LIFETIME_SECS: u64 = 60 * 60;

/// How long a container URL is reused before it is requested again: 50 minutes.
pub const FRESHNESS_WINDOW_SECS: u64 = 50 * 60;

const _: () = assert!(FRESHNESS_WINDOW_SECS < SIGNATURE_LIFETIME_SECS);

// ============================================================================
// ACCESS MODE
// ============================================================================

/// Permission requested when obtaining a container URL.
///
/// Also selects the credential cache slot consulted for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccessMode {
    #[default]
    Read,
    Write,
}

impl AccessMode {
    /// Value of the `permissions` query parameter.
    pub fn permission(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
        }
    }

    /// `Write` when `write_access` is set, else `Read`.
    pub fn from_write_flag(write_access: bool) -> Self {
        if write_access {
            Self::Write
        } else {
            Self::Read
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.permission())
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classification of a reality data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    Terrain,
    Imagery,
    Pinned,
    Model,
    #[default]
    #[serde(other)]
    Undefined,
}

// ============================================================================
// EXTENT
// ============================================================================

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn validate(&self, field: &str) -> Result<(), ValidationError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.latitude", field),
                reason: format!("{} is outside [-90, 90]", self.latitude),
            });
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::InvalidValue {
                field: format!("{}.longitude", field),
                reason: format!("{} is outside [-180, 180]", self.longitude),
            });
        }
        Ok(())
    }
}

/// Geographic bounding box of a reality data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extent {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Extent {
    pub fn new(south_west: Coordinate, north_east: Coordinate) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Check that both corners are valid WGS84 coordinates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.south_west.validate("extent.southWest")?;
        self.north_east.validate("extent.northEast")
    }

    /// Format as the `extent` query parameter: `swLon,swLat,neLon,neLat`.
    pub fn to_query_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.south_west.longitude,
            self.south_west.latitude,
            self.north_east.longitude,
            self.north_east.latitude
        )
    }
}

// ============================================================================
// REALITY DATA
// ============================================================================

/// Acquisition details of a reality data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acquisition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquirer: Option<String>,
}

/// Metadata of a reality data as exchanged with the API.
///
/// Every field is optional on the wire; `id` is absent until the platform
/// has registered the reality data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RealityDataId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Path of the entry document relative to the container root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_document: Option<String>,
    /// Size in kilobytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_accuracy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authoring: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    /// Data format, e.g. `3MX`, `Cesium3DTiles`, `LAS`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<Acquisition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_access_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_center_location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl RealityData {
    /// Create unregistered metadata with the two fields creation requires.
    pub fn new(display_name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            data_type: Some(data_type.into()),
            ..Self::default()
        }
    }

    /// The identifier, or `MissingRealityDataId` when unregistered.
    pub fn require_id(&self) -> Result<RealityDataId, InvalidStateError> {
        self.id.ok_or(InvalidStateError::MissingRealityDataId)
    }

    /// Validate metadata before it is sent to the create endpoint.
    pub fn validate_for_create(&self) -> Result<(), ValidationError> {
        require_non_blank("displayName", self.display_name.as_deref())?;
        require_non_blank("type", self.data_type.as_deref())?;
        self.validate_extent()
    }

    /// Validate metadata before it is sent to the modify endpoint.
    pub fn validate_for_modify(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.display_name {
            if name.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "displayName".to_string(),
                    reason: "must not be blank".to_string(),
                });
            }
        }
        self.validate_extent()
    }

    fn validate_extent(&self) -> Result<(), ValidationError> {
        match &self.extent {
            Some(extent) => extent.validate(),
            None => Ok(()),
        }
    }
}

fn require_non_blank(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::RequiredFieldMissing {
            field: field.to_string(),
        }),
    }
}

// ============================================================================
// LIST QUERIES
// ============================================================================

/// Parameters of a reality data list query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub itwin_id: Option<ITwinId>,
    /// Page size; the client's configured page size applies when unset.
    pub top: Option<u32>,
    pub continuation_token: Option<String>,
    pub extent: Option<Extent>,
    pub types: Vec<String>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_itwin(itwin_id: ITwinId) -> Self {
        Self {
            itwin_id: Some(itwin_id),
            ..Self::default()
        }
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    pub fn with_type(mut self, data_type: impl Into<String>) -> Self {
        self.types.push(data_type.into());
        self
    }

    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.top == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "$top".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        match &self.extent {
            Some(extent) => extent.validate(),
            None => Ok(()),
        }
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page.
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
