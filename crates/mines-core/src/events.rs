//! Session events published to presentation listeners.

use serde::{Deserialize, Serialize};

use crate::errors::ErrorData;
use crate::models::{CashOutResponse, PickResponse, Session, UserProfile};

/// Event discriminant used as the subscription key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// A user profile was fetched.
    UserInfoUpdated,
    /// A new round was created.
    GameSessionStarted,
    /// A pick was confirmed by the server.
    PickTileResponseReceived,
    /// A cash-out was confirmed by the server.
    CashOutReceived,
    /// A request to the server failed.
    RequestError,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::UserInfoUpdated,
        Self::GameSessionStarted,
        Self::PickTileResponseReceived,
        Self::CashOutReceived,
        Self::RequestError,
    ];

    /// Event name as listeners know it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UserInfoUpdated => "userInfoUpdated",
            Self::GameSessionStarted => "gameSessionStarted",
            Self::PickTileResponseReceived => "pickTileResponseReceived",
            Self::CashOutReceived => "cashOutReceived",
            Self::RequestError => "requestError",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A published event. Payloads are snapshots; listeners cannot reach the
/// manager's state through them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Fresh user profile.
    UserInfoUpdated(UserProfile),
    /// The newly created session, after local reset.
    GameSessionStarted(Session),
    /// The raw pick response.
    PickTileResponseReceived(PickResponse),
    /// The raw cash-out response.
    CashOutReceived(CashOutResponse),
    /// A classified transport or server failure.
    RequestError(ErrorData),
}

impl SessionEvent {
    /// Discriminant of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserInfoUpdated(_) => EventKind::UserInfoUpdated,
            Self::GameSessionStarted(_) => EventKind::GameSessionStarted,
            Self::PickTileResponseReceived(_) => EventKind::PickTileResponseReceived,
            Self::CashOutReceived(_) => EventKind::CashOutReceived,
            Self::RequestError(_) => EventKind::RequestError,
        }
    }
}
