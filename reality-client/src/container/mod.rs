//! Blob container URLs with a per-mode credential cache.
//!
//! A reality data's files live in a blob container. The platform hands out
//! signed container URLs that expire after 60 minutes; this module requests
//! them, reuses them for a fixed 50-minute freshness window and
//! composes per-file URLs from them.
//!
//! Each slot moves through `Empty -> Fresh -> Stale -> Fresh -> ...`.
//! Staleness is detected lazily, only when a caller asks for a URL; there is
//! no background refresh.
//!
//! # Example
//!
//! ```ignore
//! let access = ContainerAccess::new();
//! let url = access
//!     .resolve_container_url(&client, token, Some(id), itwin_id, AccessMode::Read, clock.now())
//!     .await?;
//! let tileset = compose_blob_url(&url, Some("tileset.json"))?;
//! ```

pub mod cache;
pub mod compose;
pub mod resolver;

pub use cache::{freshness_window, is_fresh, CachedCredential, CredentialCache};
pub use compose::compose_blob_url;
pub use resolver::{ContainerAccess, ContainerFetcher};
