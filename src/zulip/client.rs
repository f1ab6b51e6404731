//! Zulip REST client.
//!
//! Covers the four endpoints the bridge needs: credential check, event queue
//! registration, long-polling for events, and sending stream messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::bridge::relay::StreamSender;
use crate::common::error::{Platform, RelayError, RelayResult};
use crate::common::messages::StreamMessage;
use crate::config::types::ZulipConfig;
use crate::zulip::types::{
    ApiStatus, EventsResponse, RegisterResponse, UserResponse, BAD_EVENT_QUEUE_ID,
};

/// Long-poll requests are answered with a heartbeat well within this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Build the API base URL from a site URL, adding `/api` unless present.
pub fn api_base_url(site: &str) -> String {
    let site = site.trim_end_matches('/');
    if site.ends_with("/api") {
        site.to_string()
    } else {
        format!("{}/api", site)
    }
}

fn connection_error(e: impl std::fmt::Display) -> RelayError {
    RelayError::connection(Platform::Zulip, e)
}

/// Authenticated handle on a Zulip server.
#[derive(Clone)]
pub struct ZulipClient {
    http: Client,
    base_url: String,
    email: String,
    api_key: String,
}

impl ZulipClient {
    pub fn new(config: &ZulipConfig) -> RelayResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("zulip-matrix-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(connection_error)?;

        Ok(Self {
            http,
            base_url: api_base_url(&config.site),
            email: config.email.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Create a client and verify its credentials against the server.
    pub async fn connect(config: &ZulipConfig) -> RelayResult<Self> {
        let client = Self::new(config)?;

        let me: UserResponse = client
            .call(client.http.get(client.url("users/me")))
            .await?;
        if !me.status.is_success() {
            return Err(RelayError::auth(Platform::Zulip, me.status.msg));
        }

        info!(
            "Logged in to Zulip as {} ({})",
            me.full_name.as_deref().unwrap_or("unknown"),
            me.email.as_deref().unwrap_or(client.email())
        );
        Ok(client)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v1/{}", self.base_url, endpoint)
    }

    /// Send an authenticated request and decode the JSON body.
    ///
    /// Zulip reports most failures in the body with a non-2xx status, so
    /// the body is decoded regardless of status.
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> RelayResult<T> {
        let response = request
            .basic_auth(&self.email, Some(&self.api_key))
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        response.json::<T>().await.map_err(|e| {
            connection_error(format!("unexpected response (HTTP {}): {}", status, e))
        })
    }

    /// Register an event queue for messages in `stream`.
    pub async fn register(&self, stream: &str) -> RelayResult<(String, i64)> {
        let narrow = serde_json::json!([["stream", stream]]).to_string();
        let params = [("event_types", r#"["message"]"#.to_string()), ("narrow", narrow)];

        let response: RegisterResponse = self
            .call(self.http.post(self.url("register")).form(&params))
            .await?;
        if !response.status.is_success() {
            return Err(connection_error(response.status.msg));
        }

        let queue_id = response
            .queue_id
            .ok_or_else(|| connection_error("register response has no queue_id"))?;
        debug!("Registered Zulip event queue {}", queue_id);
        Ok((queue_id, response.last_event_id))
    }

    /// Long-poll the event queue.
    pub async fn get_events(&self, queue_id: &str, last_event_id: i64) -> RelayResult<EventsResponse> {
        let last_event_id = last_event_id.to_string();
        let params = [("queue_id", queue_id), ("last_event_id", last_event_id.as_str())];

        self.call(self.http.get(self.url("events")).query(&params))
            .await
    }

    /// Stream of messages from one Zulip stream.
    pub fn messages(&self, stream: impl Into<String>) -> MessageStream {
        MessageStream {
            client: self.clone(),
            stream: stream.into(),
            queue_id: None,
            last_event_id: -1,
        }
    }
}

/// Interpret a send acknowledgement.
pub fn check_send_ack(status: &ApiStatus) -> RelayResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(RelayError::relay_failed(&status.msg))
    }
}

#[async_trait]
impl StreamSender for ZulipClient {
    async fn send_stream_message(&self, stream: &str, topic: &str, content: &str) -> RelayResult<()> {
        let params = [
            ("type", "stream"),
            ("to", stream),
            ("topic", topic),
            ("content", content),
        ];

        let ack: ApiStatus = self
            .call(self.http.post(self.url("messages")).form(&params))
            .await
            .map_err(RelayError::relay_failed)?;
        check_send_ack(&ack)
    }
}

/// What to do after one `GET /events` response.
#[derive(Debug, PartialEq)]
pub enum PollOutcome {
    /// The server dropped our queue; register a new one.
    Reregister,
    /// Messages received, and the id to poll from next.
    Messages {
        messages: Vec<StreamMessage>,
        last_event_id: i64,
    },
}

/// Interpret an events response polled from `last_event_id`.
///
/// Every event id advances the cursor, including heartbeats, so the same
/// events are never requested twice.
pub fn handle_events_response(
    last_event_id: i64,
    response: EventsResponse,
) -> RelayResult<PollOutcome> {
    if !response.status.is_success() {
        if response.status.code.as_deref() == Some(BAD_EVENT_QUEUE_ID) {
            return Ok(PollOutcome::Reregister);
        }
        return Err(connection_error(response.status.msg));
    }

    let mut last_event_id = last_event_id;
    let mut messages = Vec::new();
    for event in response.events {
        last_event_id = last_event_id.max(event.id);
        if let Some(message) = event.message {
            messages.push(message.into());
        }
    }
    Ok(PollOutcome::Messages {
        messages,
        last_event_id,
    })
}

/// Messages from a registered event queue.
///
/// Re-registers transparently when the server expires the queue.
pub struct MessageStream {
    client: ZulipClient,
    stream: String,
    queue_id: Option<String>,
    last_event_id: i64,
}

impl MessageStream {
    /// Wait for the next batch of messages. Heartbeats yield an empty batch.
    pub async fn next_batch(&mut self) -> RelayResult<Vec<StreamMessage>> {
        loop {
            let queue_id = match self.queue_id {
                Some(ref id) => id.clone(),
                None => {
                    let (id, last_event_id) = self.client.register(&self.stream).await?;
                    self.queue_id = Some(id.clone());
                    self.last_event_id = last_event_id;
                    id
                }
            };

            let response = self.client.get_events(&queue_id, self.last_event_id).await?;
            match handle_events_response(self.last_event_id, response)? {
                PollOutcome::Reregister => {
                    warn!("Zulip event queue {} expired, registering a new one", queue_id);
                    self.queue_id = None;
                }
                PollOutcome::Messages {
                    messages,
                    last_event_id,
                } => {
                    self.last_event_id = last_event_id;
                    return Ok(messages);
                }
            }
        }
    }
}
