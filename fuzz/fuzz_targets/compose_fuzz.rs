//! Fuzz test for blob URL composition
//!
//! Feeds arbitrary relative paths into `compose_blob_url` against a signed
//! container URL. Composition must never panic, rejects exactly the paths
//! with `.` or `..` segments, and otherwise carries the container's query
//! string through untouched.
//!
//! Run with: cargo +nightly fuzz run compose_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use reality_client::compose_blob_url;
use url::Url;

fuzz_target!(|data: &[u8]| {
    let Ok(relative_path) = std::str::from_utf8(data) else {
        return;
    };
    let container = Url::parse("https://acct.blob.core.windows.net/container?sv=2020-08-04&sp=rl&sig=abc%2B123%3D")
        .expect("static container URL");

    let escapes = relative_path.split('/').any(|s| s == "." || s == "..");
    match compose_blob_url(&container, Some(relative_path)) {
        Ok(blob) => {
            assert!(!escapes, "dot segments must be rejected");
            assert_eq!(blob.query(), container.query(), "signature must be preserved");
            assert_eq!(blob.fragment(), None);
            assert_eq!(blob.host_str(), container.host_str());
            assert!(blob.path().starts_with(container.path()));
        }
        Err(_) => assert!(escapes, "only dot segments are rejected"),
    }

    assert_eq!(
        compose_blob_url(&container, None).expect("identity"),
        container
    );
});
