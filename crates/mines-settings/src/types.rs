//! Settings types.
//!
//! All structs use `#[serde(default)]` so a partial settings file only
//! overrides the keys it names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level client settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Game server connection.
    pub api: ApiSettings,
    /// Values the front-end starts a round with.
    pub game: GameDefaults,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Game server connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Base URL every endpoint is resolved against.
    pub base_url: String,
    /// Bearer token for the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Per-request deadline in milliseconds.
    pub timeout_ms: u64,
    /// Provably-fair seed sent with each new session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_seed: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/".to_string(),
            auth_token: None,
            timeout_ms: 10_000,
            client_seed: None,
        }
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_ms", &self.timeout_ms)
            .field("client_seed", &self.client_seed)
            .finish()
    }
}

/// Starting bet and mine count offered by the front-end.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameDefaults {
    /// Starting bet.
    pub bet_amount: f64,
    /// Starting mine count.
    pub mine_count: u32,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            bet_amount: 1.0,
            mine_count: 3,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter level; `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
