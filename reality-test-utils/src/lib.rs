//! Reality Data Test Utilities
//!
//! Shared test infrastructure for the reality data workspace:
//! - Proptest generators for entity types and signed container URLs
//! - JSON fixtures shaped like platform responses
//! - Assertions on error variants
//! - Tracing setup for tests

pub use reality_core::{
    AccessMode, Classification, ClientConfig, ContainerResolutionError, Coordinate, Extent,
    ITwinId, InvalidStateError, RealityData, RealityDataId, RealityError, RealityResult,
    Timestamp,
};

use chrono::{TimeZone, Utc};
use std::sync::Once;
use url::Url;
use uuid::Uuid;

// ============================================================================
// TRACING
// ============================================================================

/// Install a test-friendly fmt subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to debug output for the client crate.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reality_client=debug,warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for reality data types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a random reality data id.
    pub fn arb_reality_data_id() -> impl Strategy<Value = RealityDataId> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_access_mode() -> impl Strategy<Value = AccessMode> {
        prop_oneof![Just(AccessMode::Read), Just(AccessMode::Write)]
    }

    pub fn arb_classification() -> impl Strategy<Value = Classification> {
        prop_oneof![
            Just(Classification::Terrain),
            Just(Classification::Imagery),
            Just(Classification::Pinned),
            Just(Classification::Model),
            Just(Classification::Undefined),
        ]
    }

    /// Generate a valid WGS84 extent with north-east above south-west.
    pub fn arb_extent() -> impl Strategy<Value = Extent> {
        (-80.0f64..80.0, -170.0f64..170.0, 0.0f64..5.0, 0.0f64..5.0).prop_map(
            |(lat, lon, dlat, dlon)| {
                Extent::new(
                    Coordinate::new(lat, lon),
                    Coordinate::new(lat + dlat, lon + dlon),
                )
            },
        )
    }

    pub fn arb_data_type() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("3MX".to_string()),
            Just("Cesium3DTiles".to_string()),
            Just("LAS".to_string()),
            Just("OPC".to_string()),
            Just("PNTS".to_string()),
        ]
    }

    /// Generate registered reality data metadata.
    pub fn arb_reality_data() -> impl Strategy<Value = RealityData> {
        (
            arb_reality_data_id(),
            "[A-Za-z][A-Za-z0-9 _-]{0,30}",
            arb_data_type(),
            proptest::option::of(arb_classification()),
            proptest::option::of(arb_extent()),
            proptest::option::of("[a-z]{1,8}/[a-z]{1,8}\\.json"),
            proptest::option::of(0u64..10_000_000),
        )
            .prop_map(
                |(id, display_name, data_type, classification, extent, root_document, size)| {
                    RealityData {
                        id: Some(id),
                        classification,
                        extent,
                        root_document,
                        size,
                        ..RealityData::new(display_name, data_type)
                    }
                },
            )
    }

    /// Generate a signed blob container URL with a multi-parameter query.
    pub fn arb_container_url() -> impl Strategy<Value = Url> {
        (
            "[a-z0-9]{3,12}",
            arb_reality_data_id(),
            "[A-Za-z0-9]{16,40}",
            prop_oneof![Just("rl"), Just("racwdl")],
        )
            .prop_filter_map("valid container URL", |(account, id, sig, sp)| {
                Url::parse(&format!(
                    "https://{}.blob.core.windows.net/{}?sv=2020-08-04&sr=c&sp={}&sig={}",
                    account, id, sp, sig
                ))
                .ok()
            })
    }

    /// Generate the segments of a relative blob path.
    ///
    /// Names may contain `#`, `?`, `%` and spaces but are never `.` or `..`.
    pub fn arb_path_segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[A-Za-z0-9_.#?% -]{0,15}[A-Za-z0-9#?%]", 1..5)
    }

    /// Generate a relative blob path of one to four segments.
    pub fn arb_relative_path() -> impl Strategy<Value = String> {
        arb_path_segments().prop_map(|segments| segments.join("/"))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Canned values and platform-shaped JSON bodies.

    use super::*;
    use serde_json::{json, Value};

    pub const BASE_URL: &str = "https://api.example.test/reality-management/reality-data";

    /// A fixed instant used as `t0` in freshness tests.
    pub fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Client configuration pointing at the test host.
    pub fn test_config() -> ClientConfig {
        ClientConfig::new().with_base_url(BASE_URL)
    }

    /// Registered 3MX reality data with a root document.
    pub fn sample_reality_data() -> RealityData {
        RealityData {
            id: Some(Uuid::new_v4()),
            classification: Some(Classification::Model),
            root_document: Some("Data/RootTile.3mx".to_string()),
            size: Some(3216),
            ..RealityData::new("Sample mesh", "3MX")
        }
    }

    /// Container endpoint response for `href`.
    pub fn container_response(href: &str, access: AccessMode) -> Value {
        json!({
            "container": {
                "type": "AzureBlobSasUrl",
                "access": access.permission(),
                "_links": {
                    "containerUrl": { "href": href }
                }
            }
        })
    }

    /// Platform error body.
    pub fn error_response(code: &str, message: &str) -> Value {
        json!({ "error": { "code": code, "message": message } })
    }

    /// Signed container URL whose signature encodes `access` and `n`.
    pub fn signed_container_url(id: RealityDataId, access: AccessMode, n: usize) -> String {
        format!(
            "https://store.blob.core.windows.net/{}?sv=2020-08-04&sp={}&sig=sig{}",
            id, access, n
        )
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on reality data error variants.

    use super::*;

    /// Assert that a result is `InvalidStateError::MissingRealityDataId`.
    #[track_caller]
    pub fn assert_missing_id<T: std::fmt::Debug>(result: &RealityResult<T>) {
        match result {
            Err(RealityError::InvalidState(InvalidStateError::MissingRealityDataId)) => {}
            other => panic!("Expected MissingRealityDataId, got: {:?}", other),
        }
    }

    /// Assert that a result is a container resolution failure and return it.
    #[track_caller]
    pub fn assert_resolution_error<T: std::fmt::Debug>(
        result: &RealityResult<T>,
    ) -> &ContainerResolutionError {
        match result {
            Err(RealityError::ContainerResolution(err)) => err,
            other => panic!("Expected ContainerResolutionError, got: {:?}", other),
        }
    }
}
