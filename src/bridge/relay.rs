//! Relay callbacks for both directions.
//!
//! [`RelayHandler`] holds the bridge configuration and one outbound handle per
//! platform. Each inbound event yields at most one send on the opposite
//! platform. Errors are never handled here: they end the connected period and
//! the supervisor reconnects.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::bridge::formatter::{zulip_to_matrix_username, BridgeFormatters};
use crate::common::error::RelayResult;
use crate::common::messages::{RoomEvent, StreamMessage};
use crate::config::types::Config;

/// Outbound side of the Zulip client.
#[async_trait]
pub trait StreamSender: Send + Sync {
    /// Post `content` to `stream`/`topic` as the bot.
    async fn send_stream_message(&self, stream: &str, topic: &str, content: &str)
        -> RelayResult<()>;
}

/// Outbound side of the joined Matrix room.
#[async_trait]
pub trait RoomSender: Send + Sync {
    async fn send_text(&self, text: &str) -> RelayResult<()>;
}

/// Why an inbound event was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotStreamMessage,
    OtherStream,
    OtherTopic,
    OwnMessage,
}

/// Result of handling one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The text that was sent to the other platform.
    Relayed(String),
    Skipped(SkipReason),
}

/// One callback per direction, registered with the platform listeners.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Zulip -> Matrix.
    async fn zulip_to_matrix(&self, message: &StreamMessage) -> RelayResult<RelayOutcome>;

    /// Matrix -> Zulip.
    async fn matrix_to_zulip(&self, event: &RoomEvent) -> RelayResult<RelayOutcome>;
}

/// Identity and routing facts the filters need.
#[derive(Debug, Clone)]
pub struct RelayTarget {
    pub zulip_stream: String,
    pub zulip_topic: String,
    /// Bot email on Zulip.
    pub zulip_bot: String,
    /// Zulip site with the scheme removed.
    pub zulip_site: String,
    /// Full Matrix user id of the logged-in bot.
    pub matrix_bot: String,
}

impl RelayTarget {
    pub fn new(config: &Config, matrix_bot: impl Into<String>) -> Self {
        Self {
            zulip_stream: config.zulip.stream.clone(),
            zulip_topic: config.zulip.topic.clone(),
            zulip_bot: config.zulip.email.clone(),
            zulip_site: config.zulip_site_without_scheme(),
            matrix_bot: matrix_bot.into(),
        }
    }

    /// Check a Zulip message against the stream, topic, and self filters.
    pub fn check_stream_message(&self, message: &StreamMessage) -> Result<(), SkipReason> {
        if !message.is_stream() {
            return Err(SkipReason::NotStreamMessage);
        }
        if message.sender_email == self.zulip_bot {
            return Err(SkipReason::OwnMessage);
        }
        if message.stream.as_deref() != Some(self.zulip_stream.as_str()) {
            return Err(SkipReason::OtherStream);
        }
        if message.topic != self.zulip_topic {
            return Err(SkipReason::OtherTopic);
        }
        Ok(())
    }

    /// Events the bot itself put into the room must not go back to Zulip.
    pub fn is_own_room_event(&self, event: &RoomEvent) -> bool {
        event.sender == self.matrix_bot
    }
}

/// Relay implementation over a Zulip sender and a Matrix room sender.
pub struct RelayHandler<Z, M> {
    target: RelayTarget,
    formatters: BridgeFormatters,
    zulip: Z,
    matrix: M,
}

impl<Z: StreamSender, M: RoomSender> RelayHandler<Z, M> {
    pub fn new(target: RelayTarget, formatters: BridgeFormatters, zulip: Z, matrix: M) -> Self {
        Self {
            target,
            formatters,
            zulip,
            matrix,
        }
    }
}

#[async_trait]
impl<Z: StreamSender, M: RoomSender> Relay for RelayHandler<Z, M> {
    async fn zulip_to_matrix(&self, message: &StreamMessage) -> RelayResult<RelayOutcome> {
        if let Err(reason) = self.target.check_stream_message(message) {
            debug!("Skipping Zulip message from {}: {:?}", message.sender_email, reason);
            return Ok(RelayOutcome::Skipped(reason));
        }

        let mention = zulip_to_matrix_username(&message.sender_full_name, &self.target.zulip_site);
        let text = self.formatters.zulip_to_matrix.format(&mention, &message.content);

        info!("Zulip -> Matrix: {}", text);
        self.matrix.send_text(&text).await?;

        Ok(RelayOutcome::Relayed(text))
    }

    async fn matrix_to_zulip(&self, event: &RoomEvent) -> RelayResult<RelayOutcome> {
        // Rendering comes first so an unrenderable event fails even when
        // it was sent by the bot.
        let content = self.formatters.render_room_event(event)?;

        if self.target.is_own_room_event(event) {
            debug!("Skipping own {} event in {}", event.event_type(), event.room_id);
            return Ok(RelayOutcome::Skipped(SkipReason::OwnMessage));
        }

        info!(
            "Matrix -> Zulip [{}/{}]: {}",
            self.target.zulip_stream, self.target.zulip_topic, content
        );
        self.zulip
            .send_stream_message(&self.target.zulip_stream, &self.target.zulip_topic, &content)
            .await?;

        Ok(RelayOutcome::Relayed(content))
    }
}
