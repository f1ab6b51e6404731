//! Zulip side of the bridge.

pub mod client;
pub mod types;

pub use client::{MessageStream, ZulipClient};
