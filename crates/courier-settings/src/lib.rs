//! # courier-settings
//!
//! Configuration for the Courier push client, loaded from three layers
//! (in priority order):
//! 1. **Compiled defaults**: [`CourierSettings::default()`]
//! 2. **User file**: `~/.courier/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `COURIER_*` overrides (highest priority)
//!
//! Settings are read once at startup and handed to the client by value.
//! In particular the bridge isolation flag is computed here, once per
//! process, and never re-evaluated.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
