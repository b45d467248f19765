use chrono::Duration;
use percent_encoding::percent_decode_str;
use proptest::prelude::*;
use reality_client::{
    compose_blob_url, is_fresh, AccessMode, ApiResponse, ManualClock, MockTransport,
    RealityDataClient,
};
use reality_test_utils::fixtures::{container_response, signed_container_url, test_config};
use reality_test_utils::generators::{
    arb_access_mode, arb_container_url, arb_path_segments, arb_reality_data, arb_relative_path,
    arb_timestamp,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

fn counting_transport() -> Arc<MockTransport> {
    let counter = AtomicUsize::new(0);
    Arc::new(MockTransport::with_responder(move |req| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        let access = match req.query_param("permissions").as_deref() {
            Some("Write") => AccessMode::Write,
            _ => AccessMode::Read,
        };
        Ok(ApiResponse::new(
            200,
            container_response(&signed_container_url(uuid::Uuid::nil(), access, n), access),
        ))
    }))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Blob URLs keep the container's host and signature, and their trailing
    /// segments decode back to the requested names.
    #[test]
    fn composed_url_keeps_signature(container in arb_container_url(), segments in arb_path_segments()) {
        let path = segments.join("/");
        let blob = compose_blob_url(&container, Some(&path)).unwrap();
        prop_assert_eq!(blob.query(), container.query());
        prop_assert_eq!(blob.fragment(), None);
        prop_assert_eq!(blob.host_str(), container.host_str());
        prop_assert!(blob.path().starts_with(container.path()));

        let decoded: Vec<String> = blob
            .path_segments()
            .unwrap()
            .skip(1)
            .map(|s| percent_decode_str(s).decode_utf8().unwrap().into_owned())
            .collect();
        prop_assert_eq!(decoded, segments);
    }

    /// A relative path is accepted exactly when it has no `.` or `..` segment.
    #[test]
    fn composed_url_rejects_dot_segments(
        container in arb_container_url(),
        path in arb_relative_path(),
        dots in prop_oneof![Just("."), Just("..")],
    ) {
        let escaping = format!("{}/{}/x.json", path, dots);
        prop_assert!(compose_blob_url(&container, Some(&escaping)).is_err());
        prop_assert!(compose_blob_url(&container, Some(&path)).is_ok());
    }

    #[test]
    fn composed_url_without_path_is_identity(container in arb_container_url()) {
        prop_assert_eq!(compose_blob_url(&container, None).unwrap(), container);
    }

    /// Within the window every resolution after the first is served from the
    /// cache; at or past it exactly one new request is made.
    #[test]
    fn requests_follow_freshness_window(
        data in arb_reality_data(),
        start in arb_timestamp(),
        access in arb_access_mode(),
        offsets in prop::collection::vec(0i64..(50 * 60), 1..8),
        late_secs in (50 * 60i64)..(2 * 60 * 60),
    ) {
        let transport = counting_transport();
        let clock = Arc::new(ManualClock::new(start));
        let client = RealityDataClient::with_transport(test_config(), transport.clone())
            .unwrap()
            .with_clock(clock.clone());
        let entity = client.bind(data, None);

        runtime().block_on(async {
            let first = entity.container_url("tok", access).await.unwrap();
            for offset in &offsets {
                clock.set(start + Duration::seconds(*offset));
                let again = entity.container_url("tok", access).await.unwrap();
                assert_eq!(again, first);
            }
            assert_eq!(transport.call_count(), 1);

            clock.set(start + Duration::seconds(late_secs));
            let refreshed = entity.container_url("tok", access).await.unwrap();
            assert_ne!(refreshed, first);
            assert_eq!(transport.call_count(), 2);
        });
    }

    /// A held credential is reused exactly when `is_fresh` says it is fresh.
    #[test]
    fn cache_reuse_agrees_with_is_fresh(
        data in arb_reality_data(),
        start in arb_timestamp(),
        access in arb_access_mode(),
        elapsed_secs in 0i64..(2 * 60 * 60),
    ) {
        let transport = counting_transport();
        let clock = Arc::new(ManualClock::new(start));
        let client = RealityDataClient::with_transport(test_config(), transport.clone())
            .unwrap()
            .with_clock(clock.clone());
        let entity = client.bind(data, None);

        runtime().block_on(async {
            entity.container_url("tok", access).await.unwrap();
            let held = entity.cached_credential(access).unwrap();

            let now = start + Duration::seconds(elapsed_secs);
            clock.set(now);
            entity.container_url("tok", access).await.unwrap();

            let reused = transport.call_count() == 1;
            assert_eq!(reused, is_fresh(&held, now));
        });
    }

    /// Resolving one mode never touches the other mode's slot.
    #[test]
    fn modes_never_share_slots(
        data in arb_reality_data(),
        start in arb_timestamp(),
        access in arb_access_mode(),
        gap_secs in 0i64..(3 * 60 * 60),
    ) {
        let other = match access {
            AccessMode::Read => AccessMode::Write,
            AccessMode::Write => AccessMode::Read,
        };
        let transport = counting_transport();
        let clock = Arc::new(ManualClock::new(start));
        let client = RealityDataClient::with_transport(test_config(), transport.clone())
            .unwrap()
            .with_clock(clock.clone());
        let entity = client.bind(data, None);

        runtime().block_on(async {
            let kept = entity.container_url("tok", other).await.unwrap();
            clock.set(start + Duration::seconds(gap_secs));
            entity.container_url("tok", access).await.unwrap();

            let slot = entity.cached_credential(other).unwrap();
            assert_eq!(slot.container_url(), &kept);
            assert_eq!(slot.obtained_at(), start);
            assert_eq!(transport.call_count(), 2);
        });
    }
}
