//! Error types for the application.

use std::fmt;

use thiserror::Error;

/// Which side of the bridge an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Zulip,
    Matrix,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zulip => write!(f, "Zulip"),
            Self::Matrix => write!(f, "Matrix"),
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors that end a connected period of the bridge.
///
/// Every variant is fatal to the current connection: relay callbacks never
/// recover locally, the supervisor tears everything down and backs off.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{platform} authentication failed: {reason}")]
    AuthFailed { platform: Platform, reason: String },

    #[error("{platform} connection error: {message}")]
    Connection { platform: Platform, message: String },

    /// A send was rejected or could not be delivered. Deliberately generic:
    /// a permission denial and an invalid API key are handled the same way.
    #[error("Relay failed: {message}")]
    RelayFailed { message: String },

    #[error("Cannot render {event_type} event: {detail}")]
    UnhandledEvent { event_type: String, detail: String },

    #[error("{platform} listener stopped")]
    ListenerStopped { platform: Platform },
}

impl RelayError {
    pub fn auth(platform: Platform, reason: impl fmt::Display) -> Self {
        Self::AuthFailed {
            platform,
            reason: reason.to_string(),
        }
    }

    pub fn connection(platform: Platform, message: impl fmt::Display) -> Self {
        Self::Connection {
            platform,
            message: message.to_string(),
        }
    }

    pub fn relay_failed(message: impl fmt::Display) -> Self {
        Self::RelayFailed {
            message: message.to_string(),
        }
    }
}

/// Result type alias for relay operations.
pub type RelayResult<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_failed_display() {
        let err = RelayError::relay_failed("Invalid API key");
        assert_eq!(err.to_string(), "Relay failed: Invalid API key");
    }

    #[test]
    fn test_platform_in_message() {
        let err = RelayError::auth(Platform::Matrix, "M_FORBIDDEN");
        assert_eq!(err.to_string(), "Matrix authentication failed: M_FORBIDDEN");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::ValidationError {
            message: "zulip.email is required".to_string(),
        };
        assert!(err.to_string().contains("zulip.email"));
    }
}
