//! Transport failure classification.

use mines_core::ErrorData;

/// Result alias for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// Why a request did not produce a usable response.
///
/// Every variant lowers to an [`ErrorData`] via [`From`]; the session layer
/// only ever sees the lowered form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The deadline elapsed; the in-flight request was dropped.
    #[error("request timed out")]
    Timeout,

    /// Non-success status with a `{code, message}` body.
    #[error("server error ({status}) {code}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-declared error code.
        code: String,
        /// Server-provided description.
        message: String,
    },

    /// Non-success status with no parsable error body.
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Connection, TLS or protocol failure before a status was received.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The base URL and endpoint did not form a valid URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl TransportError {
    /// Short category string for logs.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Server { .. } => "server",
            Self::Status { .. } => "status",
            Self::Network(_) => "network",
            Self::Decode(_) => "decode",
            Self::InvalidEndpoint(_) => "invalid_endpoint",
        }
    }

    /// Classify a non-success response body.
    ///
    /// A declared `code` is kept even without a `message`; the message then
    /// falls back to the status line.
    pub fn from_status(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { code, message }) => Self::Server {
                status,
                code,
                message: message.unwrap_or_else(|| ErrorData::status_failure(status).message),
            },
            Err(_) => Self::Status { status },
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<TransportError> for ErrorData {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => Self::timeout(),
            TransportError::Server { code, message, .. } => Self::new(code, message),
            TransportError::Status { status } => Self::status_failure(status),
            TransportError::Network(message)
            | TransportError::Decode(message)
            | TransportError::InvalidEndpoint(message) => Self::request_failed(message),
        }
    }
}
