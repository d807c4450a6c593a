//! Layered settings: compiled defaults, then `~/.mines/settings.json`, then
//! `MINES_*` environment variables.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::ClientSettings;

/// Lower bound for `MINES_TIMEOUT_MS`.
pub const MIN_TIMEOUT_MS: u64 = 100;
/// Upper bound for `MINES_TIMEOUT_MS`.
pub const MAX_TIMEOUT_MS: u64 = 600_000;

/// Resolve the path to the settings file (`~/.mines/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".mines").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ClientSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClientSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<ClientSettings> {
    let defaults = serde_json::to_value(ClientSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Overlay `overlay` onto `base`.
///
/// Objects merge key by key. Any other overlay value replaces the base value
/// outright, except `null`, which leaves the base untouched.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    overlay_into(&mut base, overlay);
    base
}

fn overlay_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => overlay_into(slot, value),
                    None if value.is_null() => {}
                    None => {
                        let _ = base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply `MINES_*` environment variable overrides.
///
/// Invalid values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut ClientSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── API ─────────────────────────────────────────────────────────
    if let Some(v) = string("MINES_BASE_URL") {
        settings.api.base_url = v;
    }
    if let Some(v) = string("MINES_AUTH_TOKEN") {
        settings.api.auth_token = Some(v);
    }
    if let Some(raw) = lookup("MINES_TIMEOUT_MS") {
        match parse_in_range(&raw, MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS) {
            Some(v) => settings.api.timeout_ms = v,
            None => warn!(key = "MINES_TIMEOUT_MS", value = %raw, "invalid timeout env var, ignoring"),
        }
    }
    if let Some(v) = string("MINES_CLIENT_SEED") {
        settings.api.client_seed = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("MINES_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(raw) = lookup("MINES_LOG_JSON") {
        match parse_bool(&raw) {
            Some(v) => settings.logging.json = v,
            None => warn!(key = "MINES_LOG_JSON", value = %raw, "invalid boolean env var, ignoring"),
        }
    }

    // ── Game defaults ───────────────────────────────────────────────
    if let Some(raw) = lookup("MINES_DEFAULT_BET") {
        match parse_positive_f64(&raw) {
            Some(v) => settings.game.bet_amount = v,
            None => warn!(key = "MINES_DEFAULT_BET", value = %raw, "invalid bet env var, ignoring"),
        }
    }
    if let Some(raw) = lookup("MINES_DEFAULT_MINES") {
        match parse_in_range(&raw, 1..=24) {
            Some(v) => settings.game.mine_count = v,
            None => warn!(key = "MINES_DEFAULT_MINES", value = %raw, "invalid mine count env var, ignoring"),
        }
    }
}

// ── Env value parsers, kept pure for tests ─────────────────────────────────

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];
    const FALSY: [&str; 4] = ["false", "0", "no", "off"];
    let val = val.trim();
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(val)) {
        Some(true)
    } else if FALSY.iter().any(|f| f.eq_ignore_ascii_case(val)) {
        Some(false)
    } else {
        None
    }
}

/// Parse `val` and keep it only if it falls inside `range`.
pub fn parse_in_range<T>(val: &str, range: RangeInclusive<T>) -> Option<T>
where
    T: FromStr + PartialOrd,
{
    val.trim().parse().ok().filter(|n| range.contains(n))
}

/// A finite bet above zero.
pub fn parse_positive_f64(val: &str) -> Option<f64> {
    val.trim().parse::<f64>().ok().filter(|n| n.is_finite() && *n > 0.0)
}
