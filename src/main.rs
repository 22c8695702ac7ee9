//! ==============================================================================
//! main.rs - alert beacon entry point
//! ==============================================================================
//!
//! purpose:
//!     one binary, two roles:
//!     - service:  holds the environmental state and serves the alert level
//!     - listener: polls the service and announces changes out loud
//!
//! architecture:
//!
//!     ┌──────────────┐  POST /simulate   ┌──────────────────────────┐
//!     │ sensor feed  │ ────────────────> │ service (this binary)    │
//!     │ / simulator  │                   │  state + threshold rule  │
//!     └──────────────┘                   └────────────┬─────────────┘
//!                                                     │ GET /alert
//!                                                     │ (every 60s)
//!                                        ┌────────────┴─────────────┐
//!                                        │ listener (this binary)   │
//!                                        │  change detect -> mpg123 │
//!                                        └──────────────────────────┘
//!
//! role selection (last one wins):
//!     beacon.toml `role` -> BEACON_ROLE env -> first cli argument
//!
//! relationships:
//!     - uses: config.rs (beacon.toml + env overrides)
//!     - uses: logging.rs (tracing subscriber)
//!     - runs: service.rs or listener.rs
//!
//! ==============================================================================

mod audio;
mod config;
mod domain;
mod listener;
mod logging;
mod service;

use anyhow::Result;
use config::{BeaconConfig, Role};
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; BACKEND_URL usually lives there on the pi
    let dotenv = dotenvy::dotenv();

    let (mut config, notes) = BeaconConfig::load_or_default();
    config.apply_env()?;
    if let Some(arg) = std::env::args().nth(1) {
        config.role = arg.parse()?;
    }

    logging::init(&config.logging.level);
    if let Ok(path) = dotenv {
        tracing::info!("[CONFIG] loaded environment from {}", path.display());
    }
    for note in &notes {
        tracing::info!("[CONFIG] {}", note);
    }
    config.log_summary();

    match config.role {
        Role::Service => run_service(&config).await,
        Role::Listener => run_listener(&config).await,
    }
}

async fn run_service(config: &BeaconConfig) -> Result<()> {
    let state = service::shared_state();
    service::run_server(&config.server.bind, state, shutdown_signal()).await
}

async fn run_listener(config: &BeaconConfig) -> Result<()> {
    let settings = &config.listener;
    let source = listener::HttpAlertSource::new(settings.require_backend_url()?, settings.timeout())?;
    let player = Arc::new(audio::CommandPlayer::new(
        settings.player.clone(),
        settings.audio_dir.clone(),
        settings.audio_ext.clone(),
    ));

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });

    listener::Listener::new(source, player, settings.interval()).run(rx).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        // never resolve; the process keeps running
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
