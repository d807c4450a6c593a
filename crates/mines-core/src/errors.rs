//! Classified error payloads.
//!
//! Every failure the client can report is an [`ErrorData`]: a closed
//! [`ErrorCode`] plus a human-readable message. Codes the server declares in
//! its error body are passed through verbatim as [`ErrorCode::Server`].
//!
//! | code | origin |
//! |---|---|
//! | `TIMEOUT` | request exceeded the transport deadline |
//! | `REQUEST_FAILED` | non-success status without a parsable body, or a network failure |
//! | `NO_ACTIVE_SESSION` | local guard, no request was sent |
//! | `REQUEST_PENDING` | local guard, another mutating call is in flight |
//! | anything else | server-declared |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message attached to [`ErrorCode::Timeout`].
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Error classification.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    /// The request did not complete before the deadline.
    Timeout,
    /// Non-success status or transport failure with no more specific code.
    RequestFailed,
    /// Local guard: pick or cash-out attempted without an active session.
    NoActiveSession,
    /// Local guard: a mutating call was issued while another was in flight.
    RequestPending,
    /// Code declared by the server, passed through unchanged.
    Server(String),
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Timeout => "TIMEOUT",
            Self::RequestFailed => "REQUEST_FAILED",
            Self::NoActiveSession => "NO_ACTIVE_SESSION",
            Self::RequestPending => "REQUEST_PENDING",
            Self::Server(code) => code,
        }
    }

    /// Whether the error was raised before any request reached the transport.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::NoActiveSession | Self::RequestPending)
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "TIMEOUT" => Self::Timeout,
            "REQUEST_FAILED" => Self::RequestFailed,
            "NO_ACTIVE_SESSION" => Self::NoActiveSession,
            "REQUEST_PENDING" => Self::RequestPending,
            _ => Self::Server(code),
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self::from(code.to_owned())
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::Server(code) => code,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error, as published on `requestError` and returned from
/// every session operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct ErrorData {
    /// Classification.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl ErrorData {
    /// Build an error from any code and message.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The request exceeded its deadline.
    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, TIMEOUT_MESSAGE)
    }

    /// Generic failure carrying the underlying message.
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestFailed, message)
    }

    /// Fallback for a non-success status whose body could not be parsed.
    pub fn status_failure(status: u16) -> Self {
        Self::request_failed(format!("Request failed with status {status}"))
    }

    /// Local guard for `action` attempted without an active session.
    pub fn no_active_session(action: &str) -> Self {
        Self::new(
            ErrorCode::NoActiveSession,
            format!("Cannot {action}: No active game session"),
        )
    }

    /// Local guard for `action` attempted while another call is in flight.
    pub fn request_pending(action: &str) -> Self {
        Self::new(
            ErrorCode::RequestPending,
            format!("Cannot {action}: another request is still in flight"),
        )
    }
}
