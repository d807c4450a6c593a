//! Wire and domain models.
//!
//! [`Session`] is both the creation response of `POST game/session` and the
//! client's authoritative record of the round; pick and cash-out responses
//! are merged into it with [`Session::apply_pick`] and
//! [`Session::apply_cash_out`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ids::{SessionId, UserId};

/// Tiles on the default 5×5 board.
pub const BOARD_TILES: u32 = 25;

/// Smallest bet offered when the server does not advertise limits.
pub const DEFAULT_MIN_BET: f64 = 0.1;

/// Largest bet offered when the server does not advertise limits.
pub const DEFAULT_MAX_BET: f64 = 100.0;

/// Smallest mine count offered when the server does not advertise limits.
pub const DEFAULT_MIN_MINES: u32 = 1;

/// Largest mine count offered when the server does not advertise limits.
pub const DEFAULT_MAX_MINES: u32 = BOARD_TILES - 1;

fn default_tile_count() -> u32 {
    BOARD_TILES
}

/// Treat a missing or `null` array as empty.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treat a missing or `null` value as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Server-reported status of a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Round in progress.
    #[default]
    Active,
    /// Every safe tile was revealed.
    Completed,
    /// A mine was hit.
    Lost,
    /// The player cashed out.
    #[serde(alias = "CASHED_OUT", alias = "WON")]
    Win,
    /// Any status this client does not know; merged as still in progress.
    #[serde(other)]
    Unknown,
}

/// Authoritative record of one round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Server-assigned identifier.
    pub session_id: SessionId,
    /// Stake placed at creation.
    pub bet_amount: f64,
    /// Mines hidden on the board.
    #[serde(alias = "mines")]
    pub mine_count: u32,
    /// Tile indices revealed so far, in reveal order.
    #[serde(rename = "tiles", alias = "tilesRevealed", default, deserialize_with = "null_as_empty")]
    pub tiles_revealed: Vec<u32>,
    /// Multiplier locked in by the reveals so far.
    #[serde(default)]
    pub current_multiplier: f64,
    /// Multiplier after the next safe reveal.
    #[serde(default)]
    pub next_multiplier: f64,
    /// Payout after the next safe reveal.
    #[serde(default)]
    pub next_win_amount: f64,
    /// Payout if the player cashes out now.
    #[serde(default)]
    pub cash_out_amount: f64,
    /// Size of the board.
    #[serde(default = "default_tile_count")]
    pub number_of_tiles: u32,
    /// Round status.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SessionStatus,
    /// Mine locations, disclosed by the server once the round has ended.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mine_positions: Vec<u32>,
    /// The tile that ended the round on a loss.
    #[serde(rename = "mineTileIndex", default, skip_serializing_if = "Option::is_none")]
    pub fatal_tile: Option<u32>,
    /// Balance after the stake was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_balance: Option<f64>,
    /// Provably-fair commitment, opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provably_fair: Option<Value>,
}

impl Session {
    /// Reset the per-round progress of a freshly created session.
    ///
    /// The server is authoritative for the round's parameters, but a new
    /// round always starts with nothing revealed.
    #[must_use]
    pub fn into_fresh(mut self) -> Self {
        self.tiles_revealed.clear();
        self.mine_positions.clear();
        self.fatal_tile = None;
        self.status = SessionStatus::Active;
        self
    }

    /// Safe tiles on the board.
    pub fn safe_tiles(&self) -> u32 {
        self.number_of_tiles.saturating_sub(self.mine_count)
    }

    /// Merge a successful pick of `tile_index` and return the resulting status.
    ///
    /// Re-applying the same response leaves the session unchanged. A mine hit
    /// never appends to `tiles_revealed`; mine positions are only recorded
    /// once the round has ended.
    pub fn apply_pick(&mut self, tile_index: u32, response: &PickResponse) -> SessionStatus {
        if let Some(multiplier) = response.current_multiplier {
            self.current_multiplier = multiplier;
        }
        if let Some(multiplier) = response.next_multiplier {
            self.next_multiplier = multiplier;
        }
        if let Some(amount) = response.next_win_amount {
            self.next_win_amount = amount;
        }
        if let Some(amount) = response.cash_out_amount {
            self.cash_out_amount = amount;
        }
        if let Some(tiles) = response.number_of_tiles {
            self.number_of_tiles = tiles;
        }
        if let Some(fair) = &response.provably_fair {
            self.provably_fair = Some(fair.clone());
        }

        if response.is_loss() {
            self.status = SessionStatus::Lost;
            self.mine_positions.clone_from(&response.mine_positions);
            self.fatal_tile = Some(response.mine_tile_index.unwrap_or(tile_index));
            return self.status;
        }

        if response.tiles.is_empty() {
            self.reveal(tile_index);
        } else {
            for &tile in &response.tiles {
                self.reveal(tile);
            }
        }

        if response.status == SessionStatus::Completed {
            self.status = SessionStatus::Completed;
            if !response.mine_positions.is_empty() {
                self.mine_positions.clone_from(&response.mine_positions);
            }
        } else {
            self.status = SessionStatus::Active;
        }
        self.status
    }

    /// Merge a successful cash-out.
    pub fn apply_cash_out(&mut self, response: &CashOutResponse) {
        self.status = SessionStatus::Win;
        self.current_multiplier = response.multiplier;
        self.cash_out_amount = response.win_amount;
        if response.balance.is_some() {
            self.remaining_balance = response.balance;
        }
        if !response.mine_positions.is_empty() {
            self.mine_positions.clone_from(&response.mine_positions);
        }
    }

    fn reveal(&mut self, tile: u32) {
        if !self.tiles_revealed.contains(&tile) {
            self.tiles_revealed.push(tile);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// Response to `POST game/session/{id}/pick`.
///
/// Projection fields are optional; only those present supersede the
/// session's current values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickResponse {
    /// Session the pick was applied to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Whether the picked tile was a mine.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hit_mine: bool,
    /// Tiles revealed by the server, in reveal order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tiles: Vec<u32>,
    /// Mine locations; populated once the round has ended.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mine_positions: Vec<u32>,
    /// The tile that was a mine, when `hit_mine` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_tile_index: Option<u32>,
    /// Round status after the pick.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: SessionStatus,
    /// Multiplier locked in after the pick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_multiplier: Option<f64>,
    /// Multiplier after the next safe reveal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_multiplier: Option<f64>,
    /// Payout after the next safe reveal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_win_amount: Option<f64>,
    /// Payout if the player cashes out now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_out_amount: Option<f64>,
    /// Size of the board.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_tiles: Option<u32>,
    /// Provably-fair data, opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provably_fair: Option<Value>,
}

impl PickResponse {
    /// Whether the pick ended the round on a mine.
    pub fn is_loss(&self) -> bool {
        self.hit_mine || self.status == SessionStatus::Lost
    }

    /// Whether the pick revealed the last safe tile.
    pub fn is_completed(&self) -> bool {
        !self.is_loss() && self.status == SessionStatus::Completed
    }
}

/// Response to `POST game/session/{id}/cash-out`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashOutResponse {
    /// Final multiplier applied to the bet.
    pub multiplier: f64,
    /// Amount credited to the player.
    pub win_amount: f64,
    /// Balance after the payout.
    #[serde(default, alias = "remainingBalance", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    /// Session that was cashed out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Mine locations disclosed at the end of the round.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mine_positions: Vec<u32>,
}

// ─────────────────────────────────────────────────────────────────────────────
// User profile
// ─────────────────────────────────────────────────────────────────────────────

/// Limits advertised by the server. Unknown keys are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Smallest accepted bet.
    #[serde(default, alias = "minBetAmount", skip_serializing_if = "Option::is_none")]
    pub min_bet: Option<f64>,
    /// Largest accepted bet.
    #[serde(default, alias = "maxBetAmount", skip_serializing_if = "Option::is_none")]
    pub max_bet: Option<f64>,
    /// Fewest mines per round.
    #[serde(default, alias = "minMines", skip_serializing_if = "Option::is_none")]
    pub min_mine_count: Option<u32>,
    /// Most mines per round.
    #[serde(default, alias = "maxMines", skip_serializing_if = "Option::is_none")]
    pub max_mine_count: Option<u32>,
    /// Remaining server-provided settings.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GameConfig {
    /// Bring `bet` within the advertised limits (front-end convenience; the
    /// session manager never clamps).
    pub fn clamp_bet(&self, bet: f64) -> f64 {
        let lo = self.min_bet.unwrap_or(DEFAULT_MIN_BET);
        let hi = self.max_bet.unwrap_or(DEFAULT_MAX_BET);
        bet.max(lo).min(hi)
    }

    /// Bring `mines` within the advertised limits.
    pub fn clamp_mines(&self, mines: u32) -> u32 {
        let lo = self.min_mine_count.unwrap_or(DEFAULT_MIN_MINES);
        let hi = self.max_mine_count.unwrap_or(DEFAULT_MAX_MINES);
        mines.max(lo).min(hi)
    }
}

/// Response to `GET user`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Player identifier.
    pub user_id: UserId,
    /// Spendable balance.
    pub balance: f64,
    /// Server-advertised limits.
    #[serde(default)]
    pub config: GameConfig,
    /// Reference table of first-reveal multipliers by mine count.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_bet_multipliers: Vec<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST game/session`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Stake.
    pub bet_amount: f64,
    /// Mines to hide.
    pub mine_count: u32,
    /// Provably-fair seed, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_seed: Option<String>,
}

/// Body of `POST game/session/{id}/pick`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickTileRequest {
    /// Session the tile belongs to.
    pub session_id: SessionId,
    /// Board index of the tile.
    pub tile_index: u32,
}
