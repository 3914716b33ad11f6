//! Betting game server using the async actor model.
//!
//! Boots the database pool, runs schema migrations, and serves the
//! WebSocket API. Each running game is managed by a dedicated actor
//! task spawned through the GameManager.

mod api;
mod config;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

use holdem_core::db::Database;
use holdem_core::session::GameManager;

use crate::config::ServerConfig;

const HELP: &str = "\
Run a turn-based betting game server

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7878]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  SEED_PARTICIPANTS        Seats for new games, name:stack pairs (e.g., Alice:1000,Bob:1000)
  BLIND_INTERVAL_SECS      Default seconds between blind-level escalations
  SMALL_BLIND              Default small blind wager
  (See .env file for all configuration options)
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
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let server_config = ServerConfig::from_env(bind_override, database_url_override)?;
    server_config.validate()?;

    info!("Starting betting game server at {}", server_config.bind);

    let db = Database::new(&server_config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {e}"))?;
    info!("Database connected successfully");

    sqlx::migrate!("./migrations")
        .run(db.pool())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {e}"))?;
    info!("Migrations up to date");

    let manager = Arc::new(GameManager::new(db.ledger(), server_config.seats.clone()));

    let api_state = api::AppState {
        manager,
        db,
        defaults: api::SessionDefaults {
            blind_interval_secs: server_config.blind_interval_secs,
            small_blind: server_config.small_blind,
        },
    };

    let app = api::create_router(api_state);

    info!("Starting HTTP/WebSocket server on {}", server_config.bind);
    let listener = tokio::net::TcpListener::bind(server_config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {e}", server_config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        server_config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {e}"))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
