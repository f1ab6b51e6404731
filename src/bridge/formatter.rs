//! Message formatting for relayed text.
//!
//! Handles placeholder substitution in message format strings.
//! Supports placeholders: %user, %message

use crate::common::error::{RelayError, RelayResult};
use crate::common::messages::{Membership, RoomEvent, RoomEventKind};
use crate::config::types::FormatsConfig;

/// Default format for Zulip -> Matrix messages. `%user` is the Matrix mention.
pub const DEFAULT_ZULIP_TO_MATRIX_FORMAT: &str = "%user: %message";

/// Default format for Matrix -> Zulip messages.
pub const DEFAULT_MATRIX_TO_ZULIP_FORMAT: &str = "%user: %message";

/// Default format for Matrix room joins.
pub const DEFAULT_JOIN_FORMAT: &str = "%user joined";

/// Default format for Matrix room leaves.
pub const DEFAULT_LEAVE_FORMAT: &str = "%user quit";

/// Matrix message types that are relayed as text.
const RELAYED_MSGTYPES: [&str; 2] = ["m.text", "m.emote"];

/// Message formatter that substitutes placeholders in a format string.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    format: String,
}

impl MessageFormatter {
    /// Create a new formatter with the given format string.
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    /// Substitute placeholders in one pass; inserted values are never
    /// rescanned, so a `%message` inside a user name stays literal.
    pub fn format(&self, user: &str, message: &str) -> String {
        let mut out = String::with_capacity(self.format.len() + user.len() + message.len());
        let mut rest = self.format.as_str();

        while let Some(pos) = rest.find('%') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix("%user") {
                out.push_str(user);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("%message") {
                out.push_str(message);
                rest = after;
            } else {
                out.push('%');
                rest = &tail[1..];
            }
        }

        out.push_str(rest);
        out
    }
}

/// Render a Zulip sender as a Matrix-side mention.
///
/// `site` is the Zulip site without its URL scheme, so the mention reads
/// `@**Full Name**:chat.example.com`.
pub fn zulip_to_matrix_username(full_name: &str, site: &str) -> String {
    format!("@**{}**:{}", full_name, site)
}

/// All templates used by the relay, one per kind of relayed text.
#[derive(Debug, Clone)]
pub struct BridgeFormatters {
    pub zulip_to_matrix: MessageFormatter,
    pub matrix_to_zulip: MessageFormatter,
    pub join: MessageFormatter,
    pub leave: MessageFormatter,
}

impl Default for BridgeFormatters {
    fn default() -> Self {
        Self {
            zulip_to_matrix: MessageFormatter::new(DEFAULT_ZULIP_TO_MATRIX_FORMAT),
            matrix_to_zulip: MessageFormatter::new(DEFAULT_MATRIX_TO_ZULIP_FORMAT),
            join: MessageFormatter::new(DEFAULT_JOIN_FORMAT),
            leave: MessageFormatter::new(DEFAULT_LEAVE_FORMAT),
        }
    }
}

impl BridgeFormatters {
    /// Build formatters from config, keeping defaults for unset templates.
    pub fn from_config(formats: Option<&FormatsConfig>) -> Self {
        let mut formatters = Self::default();
        let Some(formats) = formats else {
            return formatters;
        };

        if let Some(ref f) = formats.zulip_to_matrix {
            formatters.zulip_to_matrix = MessageFormatter::new(f.as_str());
        }
        if let Some(ref f) = formats.matrix_to_zulip {
            formatters.matrix_to_zulip = MessageFormatter::new(f.as_str());
        }
        if let Some(ref f) = formats.join {
            formatters.join = MessageFormatter::new(f.as_str());
        }
        if let Some(ref f) = formats.leave {
            formatters.leave = MessageFormatter::new(f.as_str());
        }
        formatters
    }

    /// Render the Zulip-side text for a Matrix room event.
    ///
    /// Events that are neither messages nor membership changes render as
    /// their bare type tag so they remain visible. Membership changes other
    /// than join/leave and message types other than text/emote have no
    /// rendering and fail with [`RelayError::UnhandledEvent`].
    pub fn render_room_event(&self, event: &RoomEvent) -> RelayResult<String> {
        match &event.kind {
            RoomEventKind::Membership(Membership::Join) => Ok(self.join.format(&event.sender, "")),
            RoomEventKind::Membership(Membership::Leave) => {
                Ok(self.leave.format(&event.sender, ""))
            }
            RoomEventKind::Membership(Membership::Other(state)) => {
                Err(RelayError::UnhandledEvent {
                    event_type: event.event_type().to_string(),
                    detail: format!("membership '{}'", state),
                })
            }
            RoomEventKind::Message { msgtype, body } if RELAYED_MSGTYPES.contains(&msgtype.as_str()) => {
                Ok(self.matrix_to_zulip.format(&event.sender, body))
            }
            RoomEventKind::Message { msgtype, .. } => Err(RelayError::UnhandledEvent {
                event_type: event.event_type().to_string(),
                detail: format!("msgtype '{}'", msgtype),
            }),
            RoomEventKind::Other { event_type } => Ok(event_type.clone()),
        }
    }
}
