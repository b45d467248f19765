//! Fuzz test for container endpoint responses
//!
//! Arbitrary response bodies must either decode into a container envelope or
//! be rejected; decoding and error-message extraction must never panic.
//!
//! Run with: cargo +nightly fuzz run container_response_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use reality_client::wire::ContainerEnvelope;
use reality_client::ApiResponse;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(envelope) = serde_json::from_value::<ContainerEnvelope>(body.clone()) {
        let _ = url::Url::parse(&envelope.container.links.container_url.href);
    }

    let response = ApiResponse::new(403, body);
    let _ = response.error_message();
    assert!(response.into_result().is_err());
});
