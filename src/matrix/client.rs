//! Matrix client connection.
//!
//! Wraps the SDK client for the bridge's lifecycle: password login, joining
//! the bridged room, an initial sync to skip the room backlog, forwarding room
//! events over a channel, and the background sync loop.

use async_trait::async_trait;
use matrix_sdk::config::SyncSettings;
use matrix_sdk::room::Room;
use matrix_sdk::ruma::events::room::message::RoomMessageEventContent;
use matrix_sdk::ruma::events::AnySyncTimelineEvent;
use matrix_sdk::ruma::OwnedRoomOrAliasId;
use matrix_sdk::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::relay::RoomSender;
use crate::common::error::{Platform, RelayError, RelayResult};
use crate::common::messages::RoomEvent;
use crate::config::types::MatrixConfig;
use crate::matrix::events::room_event_from_sync;

const DEVICE_DISPLAY_NAME: &str = "zulip-matrix-bridge";

/// Room events handed to the relay at a time. The event handler waits for
/// room in the channel, so a stalled relay stalls the sync loop.
pub const ROOM_EVENT_BUFFER: usize = 1;

fn connection_error(e: impl std::fmt::Display) -> RelayError {
    RelayError::connection(Platform::Matrix, e)
}

/// A logged-in Matrix client.
pub struct MatrixConnection {
    client: Client,
    user_id: String,
}

impl MatrixConnection {
    /// Create a client for the configured homeserver and log in.
    pub async fn login(config: &MatrixConfig) -> RelayResult<Self> {
        let client = Client::builder()
            .homeserver_url(&config.host)
            .build()
            .await
            .map_err(connection_error)?;

        client
            .matrix_auth()
            .login_username(&config.username, &config.password)
            .initial_device_display_name(DEVICE_DISPLAY_NAME)
            .send()
            .await
            .map_err(|e| RelayError::auth(Platform::Matrix, e))?;

        let user_id = client
            .user_id()
            .map(|id| id.to_string())
            .ok_or_else(|| RelayError::auth(Platform::Matrix, "login returned no user id"))?;

        info!("Logged in to Matrix as {}", user_id);
        Ok(Self { client, user_id })
    }

    /// Full user id of the bot, e.g. `@bridge-bot:matrix.org`.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Join a room by id or alias.
    pub async fn join_room(&self, room: &str) -> RelayResult<Room> {
        let id = OwnedRoomOrAliasId::try_from(room)
            .map_err(|e| connection_error(format!("invalid room '{}': {}", room, e)))?;

        let joined = self
            .client
            .join_room_by_id_or_alias(&id, &[])
            .await
            .map_err(connection_error)?;

        info!("Joined Matrix room {} ({})", room, joined.room_id());
        Ok(joined)
    }

    /// Sync once and return the batch token. Events in this sync are the
    /// room backlog and are not relayed.
    pub async fn initial_sync(&self) -> RelayResult<String> {
        let response = self
            .client
            .sync_once(SyncSettings::default())
            .await
            .map_err(connection_error)?;
        debug!("Initial Matrix sync complete");
        Ok(response.next_batch)
    }

    /// Forward every timeline event of `room` into the returned channel.
    pub fn forward_room_events(&self, room: &Room) -> mpsc::Receiver<RoomEvent> {
        let (tx, rx) = mpsc::channel(ROOM_EVENT_BUFFER);

        room.add_event_handler(move |event: AnySyncTimelineEvent, room: Room| {
            let tx = tx.clone();
            async move {
                let event = room_event_from_sync(room.room_id(), &event);
                if let Err(e) = tx.send(event).await {
                    warn!("Failed to forward Matrix event: {}", e);
                }
            }
        });

        rx
    }

    /// Run the sync loop in the background, continuing from `token`.
    ///
    /// The task only finishes when syncing fails.
    pub fn spawn_sync(&self, token: String) -> JoinHandle<RelayResult<()>> {
        let client = self.client.clone();
        tokio::spawn(async move {
            client
                .sync(SyncSettings::default().token(token))
                .await
                .map_err(connection_error)?;
            Err(RelayError::ListenerStopped {
                platform: Platform::Matrix,
            })
        })
    }
}

#[async_trait]
impl RoomSender for Room {
    async fn send_text(&self, text: &str) -> RelayResult<()> {
        self.send(RoomMessageEventContent::text_plain(text))
            .await
            .map_err(RelayError::relay_failed)?;
        Ok(())
    }
}
