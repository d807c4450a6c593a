//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{TransportError, TransportResult};
use crate::request::ApiRequest;
use crate::Transport;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/";

/// Per-request deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Construction-time settings for [`HttpTransport`].
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Base URL every endpoint is resolved against.
    pub base_url: String,
    /// Bearer token; no `Authorization` header is sent while unset.
    pub auth_token: Option<SecretString>,
    /// Deadline for a whole request, from dispatch to body read.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug)]
struct Endpoint {
    base: Url,
    token: Option<SecretString>,
    timeout: Duration,
}

/// HTTP transport with bearer auth and a hard per-request deadline.
///
/// The base URL, token and timeout can be replaced at runtime; a change
/// applies to requests dispatched after it.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: RwLock<Endpoint>,
}

impl HttpTransport {
    /// Build a transport from `config`.
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let base = parse_base_url(&config.base_url)?;

        debug!(base_url = %base, timeout_ms = config.timeout.as_millis(), "HTTP transport initialized");

        Ok(Self {
            client,
            endpoint: RwLock::new(Endpoint {
                base,
                token: config.auth_token,
                timeout: config.timeout,
            }),
        })
    }

    /// Replace (or clear) the bearer token.
    pub fn set_auth_token(&self, token: Option<SecretString>) {
        self.endpoint.write().token = token;
    }

    /// Replace the base URL. The previous URL is kept if `url` is invalid.
    pub fn set_base_url(&self, url: &str) -> TransportResult<()> {
        let base = parse_base_url(url)?;
        debug!(base_url = %base, "base URL updated");
        self.endpoint.write().base = base;
        Ok(())
    }

    /// Replace the per-request deadline.
    pub fn set_timeout(&self, timeout: Duration) {
        self.endpoint.write().timeout = timeout;
    }

    /// Current base URL, always with a trailing slash.
    pub fn base_url(&self) -> String {
        self.endpoint.read().base.to_string()
    }

    /// Current per-request deadline.
    pub fn timeout(&self) -> Duration {
        self.endpoint.read().timeout
    }

    /// Whether a bearer token is configured.
    pub fn has_auth_token(&self) -> bool {
        self.endpoint.read().token.is_some()
    }
}

/// Parse `raw` as a base URL, appending a trailing slash so relative
/// endpoints resolve beneath it.
fn parse_base_url(raw: &str) -> TransportResult<Url> {
    let trimmed = raw.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalized).map_err(|e| TransportError::InvalidEndpoint(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidEndpoint(raw.to_owned()));
    }
    Ok(url)
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, fields(method = request.method.as_str(), endpoint = %request.endpoint))]
    async fn send(&self, request: ApiRequest) -> TransportResult<Value> {
        let (url, token, timeout) = {
            let endpoint = self.endpoint.read();
            let url = endpoint
                .base
                .join(request.endpoint.trim_start_matches('/'))
                .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {e}", request.endpoint)))?;
            (url, endpoint.token.clone(), endpoint.timeout)
        };

        let mut builder = self
            .client
            .request(request.method.into(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(authorized = token.is_some(), "dispatching request");

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, TransportError>((status, body))
        };

        // Dropping `exchange` on elapse aborts the in-flight request.
        let (status, body) = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.inspect_err(|e| warn!(kind = e.error_kind(), error = %e, "request failed"))?,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis(), "request timed out");
                return Err(TransportError::Timeout);
            }
        };

        if !status.is_success() {
            let err = TransportError::from_status(status.as_u16(), &body);
            warn!(status = status.as_u16(), kind = err.error_kind(), "server rejected request");
            return Err(err);
        }

        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn transport_for(server: &MockServer, token: Option<&str>) -> HttpTransport {
        HttpTransport::new(TransportConfig {
            base_url: server.uri(),
            auth_token: token.map(SecretString::from),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let transport = HttpTransport::new(TransportConfig {
            base_url: "http://game.test/api".into(),
            ..TransportConfig::default()
        })
        .unwrap();
        assert_eq!(transport.base_url(), "http://game.test/api/");
        assert_eq!(transport.timeout(), DEFAULT_TIMEOUT);
        assert!(!transport.has_auth_token());
    }

    #[test]
    fn invalid_base_url_rejected() {
        let result = HttpTransport::new(TransportConfig {
            base_url: String::new(),
            ..TransportConfig::default()
        });
        assert_matches!(result, Err(TransportError::InvalidEndpoint(_)));
    }

    #[test]
    fn invalid_base_url_update_keeps_previous() {
        let transport = HttpTransport::new(TransportConfig::default()).unwrap();
        assert!(transport.set_base_url("not a url").is_err());
        assert_eq!(transport.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn sends_bearer_and_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer tok-123"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userId": "u1", "balance": 10.0})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, Some("tok-123"));
        let value = transport.send(ApiRequest::user()).await.unwrap();
        assert_eq!(value["userId"], "u1");
    }

    #[tokio::test]
    async fn omits_authorization_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(200).set_body_json(json!({}))
                }
            })
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        assert!(transport.send(ApiRequest::user()).await.is_ok());
    }

    #[tokio::test]
    async fn token_can_be_set_later() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer late"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        transport.set_auth_token(Some(SecretString::from("late")));
        assert!(transport.has_auth_token());
        assert!(transport.send(ApiRequest::user()).await.is_ok());
    }

    #[tokio::test]
    async fn serializes_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/game/session"))
            .and(body_json(json!({"betAmount": 2.0, "mineCount": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessionId": "s1"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        let request = ApiRequest::post("game/session", Some(&json!({"betAmount": 2.0, "mineCount": 5}))).unwrap();
        let value = transport.send(request).await.unwrap();
        assert_eq!(value["sessionId"], "s1");
    }

    #[tokio::test]
    async fn resolves_under_base_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(TransportConfig {
            base_url: format!("{}/api/v1", server.uri()),
            ..TransportConfig::default()
        })
        .unwrap();
        assert!(transport.send(ApiRequest::user()).await.is_ok());
    }

    #[tokio::test]
    async fn error_body_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"code": "INVALID_BET", "message": "Bet too small"})),
            )
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        let err = transport
            .send(ApiRequest::post::<Value>("game/session", None).unwrap())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Server {
                status: 400,
                code: "INVALID_BET".into(),
                message: "Bet too small".into(),
            }
        );
    }

    #[tokio::test]
    async fn unparsable_error_body_synthesizes_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        let err = transport.send(ApiRequest::user()).await.unwrap_err();
        assert_eq!(err, TransportError::Status { status: 503 });
        let data = mines_core::ErrorData::from(err);
        assert_eq!(data.message, "Request failed with status 503");
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(2_000)))
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        transport.set_timeout(Duration::from_millis(100));

        let started = std::time::Instant::now();
        let err = transport.send(ApiRequest::user()).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout);
        assert!(started.elapsed() < Duration::from_millis(1_500));
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        // Bind then drop a listener to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::new(TransportConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            ..TransportConfig::default()
        })
        .unwrap();

        let err = transport.send(ApiRequest::user()).await.unwrap_err();
        assert_matches!(err, TransportError::Network(_));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let transport = transport_for(&server, None);
        let value = transport
            .send(ApiRequest::cash_out(&mines_core::SessionId::from_raw("s")))
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }
}
