//! Scripted transport for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{TransportError, TransportResult};
use crate::request::ApiRequest;
use crate::Transport;

/// Pre-programmed outcome of one call.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Succeed with this body.
    Json(Value),
    /// Fail with this error.
    Error(TransportError),
    /// Wait, then resolve the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// Wrap any response with a delay.
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// Transport that replays queued responses in order and records every
/// request it receives.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<MockResponse>>,
    requests: Mutex<Vec<ApiRequest>>,
    call_count: AtomicUsize,
}

impl MockTransport {
    /// Transport that will answer with `responses`, in order.
    pub fn new(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Queue another response.
    pub fn push(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> TransportResult<Value> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(request);

        let Some(mut current) = self.responses.lock().pop_front() else {
            return Err(TransportError::Network(format!(
                "MockTransport: no response configured for call {idx}"
            )));
        };

        loop {
            match current {
                MockResponse::Json(value) => return Ok(value),
                MockResponse::Error(err) => return Err(err),
                MockResponse::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    current = *inner;
                }
            }
        }
    }
}
