//! zulip-matrix-bridge - Zulip <-> Matrix chat bridge
//!
//! Mirrors one Zulip stream topic into one Matrix room and back, without
//! echoing the bridge's own messages.

mod bridge;
mod common;
mod config;
mod matrix;
mod zulip;

use anyhow::Result;
use tokio::signal;
use tracing::{error, info};

use bridge::{LiveSession, Supervisor};
use config::{env::get_config_path, load_and_validate};

/// Process status after SIGINT/SIGTERM.
const INTERRUPTED_EXIT_CODE: i32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("zulip-matrix-bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Zulip: {} as {}", config.zulip.site, config.zulip.email);
    info!("  Stream: {} / topic: {}", config.zulip.stream, config.zulip.topic);
    info!("  Matrix: {} as {}", config.matrix.host, config.matrix.username);
    info!("  Room: {}", config.matrix.room_id);

    let reconnect = config.reconnect_config();
    let mut supervisor = Supervisor::new(LiveSession::new(config), reconnect);

    // No cleanup on interrupt: nothing is persisted and in-flight sends are
    // simply dropped. The non-zero status marks the run as interrupted.
    tokio::select! {
        biased;
        signal = shutdown_signal() => {
            signal?;
            info!("Exiting...");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
        result = supervisor.run() => result,
    }
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C");
            }
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
