//! Bridge lifecycle: connect, relay, fail, back off, repeat.
//!
//! A [`BridgeSession`] is one connected period. The [`Supervisor`] runs
//! sessions back to back forever, sleeping between them according to
//! [`ReconnectState`]. Any error from either platform ends the session; the
//! supervisor is the only place errors are recovered from.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bridge::formatter::BridgeFormatters;
use crate::bridge::relay::{Relay, RelayHandler, RelayTarget};
use crate::common::error::{Platform, RelayError, RelayResult};
use crate::common::messages::{RoomEvent, StreamMessage};
use crate::common::reconnect::{ReconnectConfig, ReconnectState};
use crate::config::types::Config;
use crate::matrix::MatrixConnection;
use crate::zulip::{MessageStream, ZulipClient};

/// One connected period of the bridge.
#[async_trait]
pub trait BridgeSession: Send + Sync {
    /// Connect both platforms and relay until something fails.
    async fn run(&self) -> RelayResult<()>;
}

/// Source of inbound Zulip messages.
#[async_trait]
pub trait MessageSource: Send {
    async fn next_batch(&mut self) -> RelayResult<Vec<StreamMessage>>;
}

#[async_trait]
impl MessageSource for MessageStream {
    async fn next_batch(&mut self) -> RelayResult<Vec<StreamMessage>> {
        MessageStream::next_batch(self).await
    }
}

/// Relay events until either direction or the Matrix sync fails.
///
/// Matrix room events are relayed on a spawned task; Zulip messages are
/// relayed on the calling task. Both background tasks are aborted on return.
pub async fn run_connected<R, S>(
    relay: Arc<R>,
    mut messages: S,
    mut room_events: mpsc::Receiver<RoomEvent>,
    mut matrix_sync: JoinHandle<RelayResult<()>>,
) -> RelayResult<()>
where
    R: Relay + 'static,
    S: MessageSource,
{
    let mut matrix_pump: JoinHandle<RelayResult<()>> = {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move {
            while let Some(event) = room_events.recv().await {
                relay.matrix_to_zulip(&event).await?;
            }
            Err(RelayError::ListenerStopped {
                platform: Platform::Matrix,
            })
        })
    };

    let result = tokio::select! {
        result = relay_zulip(&*relay, &mut messages) => result,
        joined = &mut matrix_pump => flatten(joined),
        joined = &mut matrix_sync => flatten(joined),
    };

    matrix_pump.abort();
    matrix_sync.abort();
    result
}

async fn relay_zulip<R: Relay, S: MessageSource>(relay: &R, messages: &mut S) -> RelayResult<()> {
    loop {
        for message in messages.next_batch().await? {
            relay.zulip_to_matrix(&message).await?;
        }
    }
}

fn flatten(joined: Result<RelayResult<()>, tokio::task::JoinError>) -> RelayResult<()> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(RelayError::connection(Platform::Matrix, format!("listener task failed: {}", e))),
    }
}

/// Session against the real Zulip and Matrix servers.
pub struct LiveSession {
    config: Config,
}

impl LiveSession {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BridgeSession for LiveSession {
    async fn run(&self) -> RelayResult<()> {
        let config = &self.config;

        let zulip = ZulipClient::connect(&config.zulip).await?;
        let matrix = MatrixConnection::login(&config.matrix).await?;
        let room = matrix.join_room(&config.matrix.room_id).await?;
        let token = matrix.initial_sync().await?;

        let relay = Arc::new(RelayHandler::new(
            RelayTarget::new(config, matrix.user_id()),
            BridgeFormatters::from_config(config.formats.as_ref()),
            zulip.clone(),
            room.clone(),
        ));

        let room_events = matrix.forward_room_events(&room);

        info!("Starting listener on Matrix client");
        let matrix_sync = matrix.spawn_sync(token);

        info!("Starting message handler on Zulip client");
        let messages = zulip.messages(config.zulip.stream.clone());

        run_connected(relay, messages, room_events, matrix_sync).await
    }
}

/// Runs sessions back to back with exponential backoff between them.
pub struct Supervisor<S> {
    session: S,
    reconnect: ReconnectState,
}

impl<S: BridgeSession> Supervisor<S> {
    pub fn new(session: S, reconnect: ReconnectConfig) -> Self {
        Self {
            session,
            reconnect: ReconnectState::new(reconnect),
        }
    }

    /// Run forever. Only returns if a retry limit is configured and reached.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            info!("Starting Zulip <-> Matrix bridge");
            self.reconnect.attempt_started();

            match self.session.run().await {
                Ok(()) => warn!("Bridge session ended"),
                Err(e) => error!("Bridge session failed: {} ({:?})", e, e),
            }

            let Some(delay) = self.reconnect.next_delay() else {
                bail!(
                    "Giving up after {} consecutive failed attempts",
                    self.reconnect.attempts() + 1
                );
            };
            info!("Reconnecting in {:.1} seconds...", delay.as_secs_f64());
            tokio::time::sleep(delay).await;
        }
    }
}
