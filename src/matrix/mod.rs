//! Matrix side of the bridge.

pub mod client;
pub mod events;

pub use client::MatrixConnection;
