//! Zulip <-> Matrix relay.
//!
//! ## Module Structure
//!
//! - `formatter`: Text templates for relayed messages
//! - `relay`: Per-direction filters and the `Relay` callbacks
//! - `supervisor`: Connection lifecycle and reconnect backoff

pub mod formatter;
pub mod relay;
pub mod supervisor;

pub use supervisor::{LiveSession, Supervisor};
