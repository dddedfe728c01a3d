//! # hallway-server
//!
//! HTTP backend for the Hallway anonymous school board.
//!
//! This binary provides:
//! - **Public REST API** (axum) for browsing approved institutions, posting
//!   anonymous threads, and voting with a browser fingerprint
//! - **Institution approval queue**: visitor requests stay pending until an
//!   admin approves or rejects them
//! - **Admin REST API** behind signed, expiring bearer session tokens
//! - **SQLite persistence** via the `hallway-store` crate

mod admin;
mod api;
mod auth;
mod config;
mod error;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hallway_shared::SessionKey;
use hallway_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hallway_server=debug")),
        )
        .init();

    info!("Starting Hallway board server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        admin_enabled = config.admin_password.is_some(),
        seed_default_school = config.seed_default_school,
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Open the store and seed it
    // -----------------------------------------------------------------------
    let mut db = match &config.db_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    if let Some(path) = db.path() {
        info!(path = %path.display(), "Database opened");
    }

    if config.seed_default_school {
        db.ensure_default_school(&config.seed_school_name, &config.seed_school_city)?;
    }

    // -----------------------------------------------------------------------
    // 4. Application state for the HTTP API
    // -----------------------------------------------------------------------
    // Session signing key lives only in memory; restarting the server
    // invalidates every admin session.
    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        sessions: Arc::new(SessionKey::generate()),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
