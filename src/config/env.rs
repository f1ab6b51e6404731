//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `BRIDGE_ZULIP_EMAIL` - Zulip bot email
//! - `BRIDGE_ZULIP_API_KEY` - Zulip bot API key
//! - `BRIDGE_ZULIP_SITE` - Zulip server URL
//! - `BRIDGE_MATRIX_HOST` - Matrix homeserver URL
//! - `BRIDGE_MATRIX_USERNAME` - Matrix bot username
//! - `BRIDGE_MATRIX_PASSWORD` - Matrix bot password
//! - `BRIDGE_MATRIX_ROOM_ID` - Matrix room id or alias

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "BRIDGE";

fn var(name: &str) -> Option<String> {
    env::var(format!("{}_{}", ENV_PREFIX, name)).ok()
}

/// Apply environment variable overrides to a config.
///
/// This allows credentials to be provided via environment variables
/// instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    // Zulip
    if let Some(email) = var("ZULIP_EMAIL") {
        config.zulip.email = email;
    }
    if let Some(api_key) = var("ZULIP_API_KEY") {
        config.zulip.api_key = api_key;
    }
    if let Some(site) = var("ZULIP_SITE") {
        config.zulip.site = site;
    }

    // Matrix
    if let Some(host) = var("MATRIX_HOST") {
        config.matrix.host = host;
    }
    if let Some(username) = var("MATRIX_USERNAME") {
        config.matrix.username = username;
    }
    if let Some(password) = var("MATRIX_PASSWORD") {
        config.matrix.password = password;
    }
    if let Some(room_id) = var("MATRIX_ROOM_ID") {
        config.matrix.room_id = room_id;
    }

    config
}

/// Check if any credential environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_ZULIP_API_KEY", ENV_PREFIX),
        format!("{}_MATRIX_USERNAME", ENV_PREFIX),
        format!("{}_MATRIX_PASSWORD", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `BRIDGE_CONFIG` environment variable, otherwise returns "bridge.conf".
pub fn get_config_path() -> String {
    var("CONFIG").unwrap_or_else(|| "bridge.conf".to_string())
}
