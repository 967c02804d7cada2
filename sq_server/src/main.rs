//! Sequence game server.
//!
//! Owns the canonical state of all sessions, rooms, and games; serves the
//! `/v1` request API and the `/ws` duplex channel.

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use sequence_core::Hub;
use sq_server::{api, config::ServerConfig};
use std::net::SocketAddr;

const HELP: &str = "\
Run an authoritative Sequence game server

USAGE:
  sq_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3344]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  SERVER_NAME              Name reported by the ping endpoint
  SESSION_TTL_SECS         Idle session lifetime          [default: 86400]
  GAME_INACTIVITY_SECS     Inactive game threshold        [default: 360]
  DISCONNECT_GRACE_SECS    Reconnect grace window         [default: 10]
  REMATCH_WINDOW_SECS      Rematch voting window          [default: 30]
  HEARTBEAT_SECS           Channel liveness cadence       [default: 30]
  GC_INTERVAL_SECS         Background maintenance cadence [default: 60]
  AI_DELAY_MIN_MS          Minimum AI move latency        [default: 800]
  AI_DELAY_MAX_MS          Maximum AI move latency        [default: 1200]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = ServerConfig::from_env(bind_override)?;
    config.validate()?;
    info!("starting '{}' at {}", config.server_name, config.bind);

    let hub = Hub::new(config.hub_config());
    hub.spawn_background();

    let state = api::AppState { hub };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
