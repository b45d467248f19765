//! Reality Data Client
//!
//! Typed client for the reality management API: list, fetch, create, modify
//! and delete reality data, manage iTwin associations, and obtain signed
//! blob container URLs for reading or writing the underlying files.
//!
//! Container URLs are cached per entity and access mode and reused for a
//! fixed 50-minute freshness window below the platform's 60-minute
//! signature lifetime.
//!
//! ```ignore
//! let client = RealityDataClient::new(ClientConfig::from_env())?;
//! let entity = client.get_reality_data(&token, id, Some(itwin_id)).await?;
//! let tileset = entity.blob_url(&token, Some("tileset.json"), AccessMode::Read).await?;
//! ```

pub mod client;
pub mod container;
pub mod entity;
pub mod mock;
pub mod transport;
pub mod wire;

pub use client::RealityDataClient;
pub use container::{
    compose_blob_url, freshness_window, is_fresh, CachedCredential, ContainerAccess,
    ContainerFetcher, CredentialCache,
};
pub use entity::RealityDataEntity;
pub use mock::MockTransport;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport};

pub use reality_core::{
    AccessMode, ApiError, ClientConfig, Clock, ContainerResolutionError, ITwinId,
    InvalidStateError, ListQuery, ManualClock, Page, RealityData, RealityDataId, RealityError,
    RealityResult, SystemClock, Timestamp,
};
