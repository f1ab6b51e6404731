//! Zulip REST API payloads.

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::common::messages::StreamMessage;

/// Error code returned by `GET /events` once the server has garbage
/// collected our event queue.
pub const BAD_EVENT_QUEUE_ID: &str = "BAD_EVENT_QUEUE_ID";

/// Fields present on every Zulip API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub result: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl ApiStatus {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }
}

/// `GET /users/me`.
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// `POST /register`.
#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    pub queue_id: Option<String>,
    #[serde(default)]
    pub last_event_id: i64,
}

/// `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsResponse {
    #[serde(flatten)]
    pub status: ApiStatus,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: i64,
    /// Only set on `message` events.
    pub message: Option<WireMessage>,
}

/// A message as delivered inside a `message` event.
#[derive(Debug, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub sender_email: String,
    pub sender_full_name: String,
    pub display_recipient: Recipient,
    #[serde(default)]
    pub subject: String,
    pub content: String,
}

/// Stream name for stream messages, the recipient list for private ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    Stream(String),
    Users(IgnoredAny),
}

impl From<WireMessage> for StreamMessage {
    fn from(msg: WireMessage) -> Self {
        let stream = match msg.display_recipient {
            Recipient::Stream(name) => Some(name),
            Recipient::Users(_) => None,
        };
        StreamMessage {
            message_type: msg.message_type,
            sender_email: msg.sender_email,
            sender_full_name: msg.sender_full_name,
            stream,
            topic: msg.subject,
            content: msg.content,
        }
    }
}
