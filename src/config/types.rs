//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

use crate::common::reconnect::ReconnectConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub zulip: ZulipConfig,
    pub matrix: MatrixConfig,
    pub backoff: Option<BackoffConfig>,
    pub formats: Option<FormatsConfig>,
}

/// Zulip bot and the single stream/topic it mirrors.
#[derive(Debug, Clone, Deserialize)]
pub struct ZulipConfig {
    /// Bot email; also the identity used to drop the bridge's own messages.
    pub email: String,
    pub api_key: String,
    /// Server URL, e.g. `https://chat.zulip.org`.
    pub site: String,
    pub stream: String,
    #[serde(alias = "subject")]
    pub topic: String,
}

/// Matrix bot and the single room it mirrors.
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixConfig {
    /// Homeserver URL, e.g. `https://matrix.org`.
    pub host: String,
    pub username: String,
    pub password: String,
    /// Room id (`!abc:host`) or alias (`#room:host`).
    pub room_id: String,
}

/// Reconnection backoff settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BackoffConfig {
    pub min_delay_secs: Option<u64>,
    pub max_delay_secs: Option<u64>,
    pub success_equivalent_secs: Option<u64>,
    pub max_retries: Option<usize>,
    pub jitter: Option<bool>,
}

/// Message templates. Placeholders: `%user`, `%message`.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatsConfig {
    pub zulip_to_matrix: Option<String>,
    pub matrix_to_zulip: Option<String>,
    pub join: Option<String>,
    pub leave: Option<String>,
}

impl Config {
    /// Zulip site with the URL scheme removed, as used in Matrix mentions.
    pub fn zulip_site_without_scheme(&self) -> String {
        self.zulip
            .site
            .replace("https://", "")
            .replace("http://", "")
    }

    /// Build the reconnect policy, falling back to defaults for unset values.
    pub fn reconnect_config(&self) -> ReconnectConfig {
        let defaults = ReconnectConfig::default();
        let Some(ref backoff) = self.backoff else {
            return defaults;
        };

        ReconnectConfig {
            min_delay: backoff
                .min_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.min_delay),
            max_delay: backoff
                .max_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_delay),
            jitter: backoff.jitter.unwrap_or(defaults.jitter),
            max_attempts: backoff.max_retries,
            // 0 disables the success-equivalent reset
            success_equivalent: match backoff.success_equivalent_secs {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.success_equivalent,
            },
            ..defaults
        }
    }
}
