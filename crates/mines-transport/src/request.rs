//! Request descriptors for the game server API.

use mines_core::{PickTileRequest, SessionId, StartSessionRequest};
use serde::Serialize;
use serde_json::Value;

use crate::error::{TransportError, TransportResult};

/// HTTP method of an API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl Method {
    /// Method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
        }
    }
}

/// One call against the server, relative to the configured base URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the base URL, without a leading slash.
    pub endpoint: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// `GET endpoint` with no body.
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: None,
        }
    }

    /// `POST endpoint` with an optional serialized body.
    pub fn post<B: Serialize>(endpoint: impl Into<String>, body: Option<&B>) -> TransportResult<Self> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body,
        })
    }

    /// `GET user`
    pub fn user() -> Self {
        Self::get("user")
    }

    /// `POST game/session`
    pub fn start_session(body: &StartSessionRequest) -> TransportResult<Self> {
        Self::post("game/session", Some(body))
    }

    /// `POST game/session/{id}/pick`
    pub fn pick_tile(body: &PickTileRequest) -> TransportResult<Self> {
        Self::post(format!("game/session/{}/pick", body.session_id), Some(body))
    }

    /// `POST game/session/{id}/cash-out`
    pub fn cash_out(session_id: &SessionId) -> Self {
        Self {
            method: Method::Post,
            endpoint: format!("game/session/{session_id}/cash-out"),
            body: None,
        }
    }
}
