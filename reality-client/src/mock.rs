//! Scripted transport for tests.

use crate::transport::{ApiRequest, ApiResponse, Transport};
use async_trait::async_trait;
use reality_core::{ApiError, RealityError, RealityResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&ApiRequest) -> RealityResult<ApiResponse> + Send + Sync>;

/// Mock transport for testing.
///
/// Answers with queued responses in FIFO order, or with a responder closure
/// once the queue is empty. Every request is recorded.
pub struct MockTransport {
    queue: Mutex<VecDeque<RealityResult<ApiResponse>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<ApiRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Create a mock with an empty queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Create a mock that computes every response from the request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> RealityResult<ApiResponse> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_response(&self, response: ApiResponse) {
        lock(&self.queue).push_back(Ok(response));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push_response(ApiResponse::new(status, body));
    }

    pub fn push_error(&self, error: impl Into<RealityError>) {
        lock(&self.queue).push_back(Err(error.into()));
    }

    /// Number of requests executed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &lock(&self.queue).len())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> RealityResult<ApiResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = lock(&self.queue).pop_front();
        match (queued, &self.responder) {
            (Some(result), _) => result,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(ApiError::Transport {
                reason: format!("No scripted response for {} {}", request.method, request.url),
            }
            .into()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use url::Url;

    fn request() -> ApiRequest {
        ApiRequest::get(Url::parse("https://example.test/x").unwrap(), "tok")
    }

    #[tokio::test]
    async fn test_queue_is_fifo_then_exhausted() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({"n": 1}));
        mock.push_json(404, json!({"n": 2}));

        assert_eq!(mock.execute(request()).await.unwrap().body["n"], 1);
        assert_eq!(mock.execute(request()).await.unwrap().status, 404);
        assert!(mock.execute(request()).await.is_err());
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_responder_answers_after_queue() {
        let mock = MockTransport::with_responder(|req| {
            Ok(ApiResponse::new(200, json!({"path": req.url.path()})))
        });
        mock.push_error(ApiError::Transport {
            reason: "first".to_string(),
        });

        assert!(mock.execute(request()).await.is_err());
        let response = mock.execute(request()).await.unwrap();
        assert_eq!(response.body["path"], "/x");
    }
}
