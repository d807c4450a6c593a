//! Client-side game state.

use serde::{Deserialize, Serialize};

use crate::models::SessionStatus;

/// Coarse state of the round as seen by the client.
///
/// `None` until the first session is created; terminal states hold until the
/// next `start_session`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameState {
    /// No session has been created yet.
    #[default]
    None,
    /// A round is in progress.
    Active,
    /// The player cashed out.
    Win,
    /// Every safe tile was revealed.
    Completed,
    /// A mine was hit.
    Lost,
}

impl GameState {
    /// Whether pick and cash-out are allowed.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Whether the round has ended.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Win | Self::Completed | Self::Lost)
    }
}

impl From<SessionStatus> for GameState {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Active | SessionStatus::Unknown => Self::Active,
            SessionStatus::Completed => Self::Completed,
            SessionStatus::Lost => Self::Lost,
            SessionStatus::Win => Self::Win,
        }
    }
}
