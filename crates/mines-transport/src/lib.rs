//! # mines-transport
//!
//! Request/response plumbing between the session layer and the game server.
//!
//! - [`Transport`]: the seam the session manager talks to
//! - [`HttpTransport`]: reqwest implementation with bearer auth and a hard deadline
//! - [`MockTransport`]: scripted implementation for tests
//!
//! Failures are classified as [`TransportError`] and lowered to
//! [`mines_core::ErrorData`] before they reach listeners. Nothing here retries.

#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod mock;
pub mod request;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{TransportError, TransportResult};
pub use http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, HttpTransport, TransportConfig};
pub use mock::{MockResponse, MockTransport};
pub use request::{ApiRequest, Method};

/// Sends one API call and returns the decoded JSON body.
///
/// Implementors must be `Send + Sync` so one instance can be shared behind an
/// `Arc` by every caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `request`. An empty success body decodes to [`Value::Null`].
    async fn send(&self, request: ApiRequest) -> TransportResult<Value>;
}

/// Perform `request` and deserialize the body as `T`.
pub async fn send_json<T: DeserializeOwned>(transport: &dyn Transport, request: ApiRequest) -> TransportResult<T> {
    let value = transport.send(request).await?;
    serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
}
