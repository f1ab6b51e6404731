//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

const PLACEHOLDER_PREFIX: &str = "YOUR_";

fn is_http_url(value: &str) -> bool {
    value.starts_with("https://") || value.starts_with("http://")
}

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Zulip
    let zulip = &config.zulip;
    for (name, value) in [
        ("zulip.email", &zulip.email),
        ("zulip.api_key", &zulip.api_key),
        ("zulip.site", &zulip.site),
        ("zulip.stream", &zulip.stream),
        ("zulip.topic", &zulip.topic),
    ] {
        if value.is_empty() {
            errors.push(format!("{} is required", name));
        }
    }
    if zulip.api_key.starts_with(PLACEHOLDER_PREFIX) {
        errors.push("zulip.api_key has not been configured (still using placeholder)".to_string());
    }
    if !zulip.site.is_empty() && !is_http_url(&zulip.site) {
        errors.push(format!(
            "zulip.site '{}' must start with http:// or https://",
            zulip.site
        ));
    }

    // Matrix
    let matrix = &config.matrix;
    for (name, value) in [
        ("matrix.host", &matrix.host),
        ("matrix.username", &matrix.username),
        ("matrix.password", &matrix.password),
        ("matrix.room_id", &matrix.room_id),
    ] {
        if value.is_empty() {
            errors.push(format!("{} is required", name));
        }
    }
    if matrix.password.starts_with(PLACEHOLDER_PREFIX) {
        errors.push("matrix.password has not been configured (still using placeholder)".to_string());
    }
    if !matrix.host.is_empty() && !is_http_url(&matrix.host) {
        errors.push(format!(
            "matrix.host '{}' must start with http:// or https://",
            matrix.host
        ));
    }
    if !matrix.room_id.is_empty()
        && !(matrix.room_id.starts_with('!') || matrix.room_id.starts_with('#'))
    {
        errors.push(format!(
            "matrix.room_id '{}' must be a room id (!...) or alias (#...)",
            matrix.room_id
        ));
    }

    // Backoff
    if let Some(ref backoff) = config.backoff {
        if let (Some(min), Some(max)) = (backoff.min_delay_secs, backoff.max_delay_secs) {
            if min > max {
                errors.push(format!(
                    "backoff.min_delay_secs ({}) exceeds backoff.max_delay_secs ({})",
                    min, max
                ));
            }
        }
        if backoff.max_retries == Some(0) {
            errors.push("backoff.max_retries must be non-zero (omit it to retry forever)".to_string());
        }
    }

    // Format strings
    if let Some(ref formats) = config.formats {
        for (name, format) in [
            ("formats.zulip_to_matrix", &formats.zulip_to_matrix),
            ("formats.matrix_to_zulip", &formats.matrix_to_zulip),
            ("formats.join", &formats.join),
            ("formats.leave", &formats.leave),
        ] {
            if let Some(format) = format {
                if !format.contains("%user") {
                    errors.push(format!("{} '{}' must contain %user", name, format));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::test_support::make_test_config;
    use crate::config::types::{BackoffConfig, FormatsConfig};

    #[test]
    fn test_valid_config_passes() {
        let config = make_test_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_api_key_fails() {
        let mut config = make_test_config();
        config.zulip.api_key = String::new();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("zulip.api_key"));
    }

    #[test]
    fn test_placeholder_password_fails() {
        let mut config = make_test_config();
        config.matrix.password = "YOUR_MATRIX_PASSWORD".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("placeholder"));
    }

    #[test]
    fn test_site_without_scheme_fails() {
        let mut config = make_test_config();
        config.zulip.site = "chat.example.com".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("zulip.site"));
    }

    #[test]
    fn test_bad_room_id_fails() {
        let mut config = make_test_config();
        config.matrix.room_id = "abc:host".to_string();

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("matrix.room_id"));
    }

    #[test]
    fn test_room_alias_passes() {
        let mut config = make_test_config();
        config.matrix.room_id = "#zulip:matrix.org".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_errors_are_collected() {
        let mut config = make_test_config();
        config.zulip.stream = String::new();
        config.matrix.username = String::new();

        let message = validate_config(&config).unwrap_err().to_string();
        assert!(message.contains("zulip.stream"));
        assert!(message.contains("matrix.username"));
    }

    #[test]
    fn test_inverted_backoff_fails() {
        let mut config = make_test_config();
        config.backoff = Some(BackoffConfig {
            min_delay_secs: Some(120),
            max_delay_secs: Some(60),
            success_equivalent_secs: None,
            max_retries: None,
            jitter: None,
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("min_delay_secs"));
    }

    #[test]
    fn test_format_without_user_fails() {
        let mut config = make_test_config();
        config.formats = Some(FormatsConfig {
            zulip_to_matrix: None,
            matrix_to_zulip: Some("%message".to_string()),
            join: None,
            leave: None,
        });

        let result = validate_config(&config);
        assert!(result.unwrap_err().to_string().contains("formats.matrix_to_zulip"));
    }
}
