//! Canonical inbound event types for bridge communication.
//!
//! Both platform clients convert their wire events into these types before
//! handing them to the relay, so the relay never sees SDK or JSON types.

/// A message delivered by the Zulip event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Zulip message type: `"stream"` or `"private"`.
    pub message_type: String,
    pub sender_email: String,
    pub sender_full_name: String,
    /// Stream name; `None` for private messages.
    pub stream: Option<String>,
    /// Topic (Zulip's `subject` field).
    pub topic: String,
    pub content: String,
}

impl StreamMessage {
    pub fn is_stream(&self) -> bool {
        self.message_type == "stream"
    }
}

/// Matrix room membership change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Membership {
    Join,
    Leave,
    /// invite, ban, knock, or anything custom.
    Other(String),
}

impl Membership {
    pub fn from_state(state: &str) -> Self {
        match state {
            "join" => Self::Join,
            "leave" => Self::Leave,
            other => Self::Other(other.to_string()),
        }
    }
}

/// What happened in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEventKind {
    /// `m.room.member`.
    Membership(Membership),
    /// `m.room.message` with its msgtype (`m.text`, `m.emote`, ...).
    Message { msgtype: String, body: String },
    /// Any other timeline event, identified by its type tag.
    Other { event_type: String },
}

/// A timeline event from the bridged Matrix room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    pub room_id: String,
    /// Full Matrix user id, e.g. `@bob:matrix.org`.
    pub sender: String,
    pub kind: RoomEventKind,
}

impl RoomEvent {
    /// The Matrix event type tag this event was built from.
    pub fn event_type(&self) -> &str {
        match &self.kind {
            RoomEventKind::Membership(_) => "m.room.member",
            RoomEventKind::Message { .. } => "m.room.message",
            RoomEventKind::Other { event_type } => event_type,
        }
    }
}
