//! # mines-settings
//!
//! Client configuration, loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ClientSettings::default()`]
//! 2. **User file**: `~/.mines/settings.json`, deep-merged over defaults
//! 3. **Environment variables**: `MINES_*` overrides
//!
//! Command-line flags, when a front-end has them, go on top of all three.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ApiSettings, ClientSettings, GameDefaults, LoggingSettings};
