//! # mines-core
//!
//! Shared vocabulary for the mines game client.
//!
//! - **Ids**: [`SessionId`], [`UserId`] as opaque server-assigned newtypes
//! - **Models**: [`Session`], [`PickResponse`], [`CashOutResponse`], [`UserProfile`]
//!   and the request bodies sent to the game server
//! - **Errors**: [`ErrorData`] with the closed [`ErrorCode`] taxonomy
//! - **Events**: [`SessionEvent`] payloads keyed by [`EventKind`]
//! - **State**: the derived [`GameState`] machine

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod ids;
pub mod models;
pub mod state;

pub use errors::{ErrorCode, ErrorData};
pub use events::{EventKind, SessionEvent};
pub use ids::{SessionId, UserId};
pub use models::{
    BOARD_TILES, CashOutResponse, GameConfig, PickResponse, PickTileRequest, Session,
    SessionStatus, StartSessionRequest, UserProfile,
};
pub use state::GameState;
