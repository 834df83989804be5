//! Configuration module for the Inkpress backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for authoring API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Translation engine client settings
    pub translate: TranslateConfig,
}

/// Settings for the external translation engine client.
///
/// Passed into the engine constructor explicitly; nothing here is read from
/// process-wide state after startup.
#[derive(Debug, Clone)]
pub struct TranslateConfig {
    /// Endpoint of the HTML localization service
    pub endpoint: String,
    /// Bearer token for the localization service
    pub api_key: String,
    /// Request timeout in seconds for engine calls
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("INKPRESS_API_PSK").ok();

        let db_path = env::var("INKPRESS_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let bind_addr = env::var("INKPRESS_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid INKPRESS_BIND_ADDR format");

        let log_level = env::var("INKPRESS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let translate = TranslateConfig {
            endpoint: env::var("INKPRESS_TRANSLATE_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:8090/v1/localize".to_string()),
            api_key: env::var("INKPRESS_TRANSLATE_API_KEY").unwrap_or_default(),
            timeout_secs: env::var("INKPRESS_TRANSLATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        };

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            translate,
        }
    }
}
