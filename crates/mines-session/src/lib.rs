//! # mines-session
//!
//! The game-session layer of the mines client.
//!
//! - [`EventBus`]: typed publish/subscribe between the manager and presentation
//! - [`SessionManager`]: start, pick and cash-out against the server, with the
//!   authoritative in-memory session and [`GameState`](mines_core::GameState)
//!
//! Listeners subscribe to the bus and read snapshots; they never write state.

#![deny(unsafe_code)]

pub mod bus;
pub mod manager;

pub use bus::{EventBus, Handler, SubscriptionId};
pub use manager::{CashOutResult, PickResult, SessionManager, SessionResult};
