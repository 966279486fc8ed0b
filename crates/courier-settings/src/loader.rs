//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`CourierSettings::default()`]
//! 2. If `~/.courier/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `COURIER_*` environment overrides (highest priority)
//! 4. [`CourierSettings::validate`]
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{ApnsEnvironment, CourierSettings};

/// Resolve the path to the settings file (`~/.courier/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".courier").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<CourierSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<CourierSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate();
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
fn load_file_layer(path: &Path) -> Result<CourierSettings> {
    let defaults = serde_json::to_value(CourierSettings::default())?;

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

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut CourierSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_overrides_from<F>(settings: &mut CourierSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let parsed = |name: &str, parse: fn(&str) -> Option<u64>| {
        let val = string(name)?;
        let result = parse(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
        }
        result
    };
    let flag = |name: &str| {
        let val = string(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    };

    // ── Gateway ─────────────────────────────────────────────────────
    if let Some(v) = string("COURIER_APNS_ENVIRONMENT") {
        match parse_environment(&v) {
            Some(env) => settings.apns.environment = env,
            None => tracing::warn!(value = %v, "invalid COURIER_APNS_ENVIRONMENT, ignoring"),
        }
    }
    if let Some(v) = flag("COURIER_APNS_ALT_PORT") {
        settings.apns.use_alternative_port = v;
    }
    if let Some(v) = string("COURIER_APNS_TOPIC") {
        settings.apns.default_topic = Some(v);
    }

    // ── Credentials ─────────────────────────────────────────────────
    if let Some(v) = string("COURIER_APNS_KEY_PATH") {
        settings.apns.credentials.key_path = Some(v);
    }
    if let Some(v) = string("COURIER_APNS_KEY_ID") {
        settings.apns.credentials.key_id = v;
    }
    if let Some(v) = string("COURIER_APNS_TEAM_ID") {
        settings.apns.credentials.team_id = v;
    }
    if let Some(v) = string("COURIER_APNS_CERT_PATH") {
        settings.apns.credentials.cert_path = Some(v);
    }

    // ── Connection ──────────────────────────────────────────────────
    if let Some(v) = string("COURIER_PROXY_HOST") {
        settings.connection.proxy_host = Some(v);
    }
    if let Some(v) = parsed("COURIER_PROXY_PORT", |s| {
        parse_u64_range(s, 1, u64::from(u16::MAX))
    }) {
        settings.connection.proxy_port = Some(v as u16);
    }

    // ── Bridge ──────────────────────────────────────────────────────
    if let Some(v) = flag("COURIER_BRIDGE_ISOLATE") {
        settings.bridge.force_thread_isolation = v;
    }
    if let Some(v) = parsed("COURIER_BRIDGE_TIMEOUT_SECS", |s| {
        parse_u64_range(s, 1, 86_400)
    }) {
        settings.bridge.join_timeout_secs = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("COURIER_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a gateway environment name.
pub fn parse_environment(val: &str) -> Option<ApnsEnvironment> {
    match val.to_lowercase().as_str() {
        "production" | "prod" | "live" => Some(ApnsEnvironment::Production),
        "sandbox" | "development" | "dev" => Some(ApnsEnvironment::Sandbox),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
