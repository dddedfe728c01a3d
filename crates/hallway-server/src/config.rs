//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development -- except the admin password, which
//! has no default: leaving `ADMIN_PASSWORD` unset disables the admin API.

use std::net::SocketAddr;
use std::path::PathBuf;

use hallway_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_SECS};

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Explicit SQLite database path.  `None` uses the platform data dir.
    /// Env: `DB_PATH`
    pub db_path: Option<PathBuf>,

    /// Admin login name.
    /// Env: `ADMIN_USERNAME`
    /// Default: `"admin"`
    pub admin_username: String,

    /// Admin password.  `None` disables the admin API entirely.
    /// Env: `ADMIN_PASSWORD`
    pub admin_password: Option<String>,

    /// Lifetime of an issued admin session token, in seconds.
    /// Env: `SESSION_TTL_SECS`
    /// Default: 43200 (12 hours)
    pub session_ttl_secs: u64,

    /// Whether to ensure the default school exists at startup.
    /// Env: `SEED_DEFAULT_SCHOOL` (true/false)
    /// Default: `true`
    pub seed_default_school: bool,

    /// Name of the default school.
    /// Env: `SEED_SCHOOL_NAME`
    /// Default: `"Vidya Mandir"`
    pub seed_school_name: String,

    /// City of the default school.
    /// Env: `SEED_SCHOOL_CITY`
    /// Default: `"Mylapore"`
    pub seed_school_city: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            db_path: None,
            admin_username: "admin".to_string(),
            admin_password: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            seed_default_school: true,
            seed_school_name: "Vidya Mandir".to_string(),
            seed_school_city: "Mylapore".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("ADMIN_USERNAME") {
            if !name.is_empty() {
                config.admin_username = name;
            }
        }

        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            if !password.is_empty() {
                config.admin_password = Some(password);
            }
        }

        if let Ok(val) = std::env::var("SESSION_TTL_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.session_ttl_secs = secs;
            } else {
                tracing::warn!(value = %val, "Invalid SESSION_TTL_SECS, using default");
            }
        }

        if let Ok(val) = std::env::var("SEED_DEFAULT_SCHOOL") {
            config.seed_default_school = val != "false" && val != "0";
        }

        if let Ok(name) = std::env::var("SEED_SCHOOL_NAME") {
            config.seed_school_name = name;
        }

        if let Ok(city) = std::env::var("SEED_SCHOOL_CITY") {
            config.seed_school_city = city;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
