//! Configuration management for the inventory platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with the INV prefix (INV__DATABASE__URL)

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Outbound mail configuration
    pub mail: MailConfig,

    /// Low-stock alert pipeline
    pub alerts: AlertConfig,

    /// IP geolocation lookups
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Mail provider HTTP endpoint
    pub api_endpoint: String,

    /// Mail provider API key. Mail is only logged when unset.
    pub api_key: Option<String>,

    /// Sender address
    pub from: String,

    /// Operational inbox used when no administrator is signed in
    pub fallback_recipient: String,

    /// Public frontend URL, used to build password reset links
    pub app_url: String,

    /// Seconds allowed for one delivery request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    /// Pending low-stock notifications held before new ones are dropped
    pub queue_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeolocationConfig {
    /// ip-api compatible lookup endpoint
    pub api_endpoint: String,

    /// Public address probed when the client address is local or unknown
    pub fallback_ip: String,

    /// Seconds allowed for one lookup
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("INV_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("mail.api_endpoint", "https://api.resend.com/emails")?
            .set_default("mail.from", "Inventario <onboarding@resend.dev>")?
            .set_default("mail.fallback_recipient", "inventario.alertas@gmail.com")?
            .set_default("mail.app_url", "http://localhost:5173")?
            .set_default("mail.request_timeout_secs", 10)?
            .set_default("alerts.queue_capacity", 256)?
            .set_default("geolocation.api_endpoint", "http://ip-api.com/json")?
            .set_default("geolocation.fallback_ip", "104.28.210.155")?
            .set_default("geolocation.request_timeout_secs", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (INV__ prefix)
            .add_source(
                Environment::with_prefix("INV")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
