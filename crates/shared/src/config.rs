//! Application configuration management.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Internal RPC authentication.
    pub api: ApiConfig,
    /// Exchange rate cache settings.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Refund workflow settings.
    #[serde(default)]
    pub refund: RefundConfig,
    /// Outbound gateway adapters keyed by callback handler name.
    #[serde(default)]
    pub gateways: HashMap<String, GatewayConfig>,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Bearer key required on the internal RPC routes.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Shared key presented as `Authorization: Bearer <key>`.
    pub internal_key: String,
}

/// Exchange rate cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Maximum number of cached currency pairs.
    #[serde(default = "default_rate_cache_capacity")]
    pub cache_capacity: u64,
    /// Time-to-live of a cached rate in seconds.
    #[serde(default = "default_rate_cache_ttl")]
    pub cache_ttl_secs: u64,
}

fn default_rate_cache_capacity() -> u64 {
    1_000
}

fn default_rate_cache_ttl() -> u64 {
    600 // 10 minutes
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_rate_cache_capacity(),
            cache_ttl_secs: default_rate_cache_ttl(),
        }
    }
}

/// Refund workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RefundConfig {
    /// How many times an order update is retried after a version conflict.
    #[serde(default = "default_conflict_retries")]
    pub conflict_retries: u32,
    /// Payment stage used for money-back cost lookups.
    #[serde(default = "default_payment_stage")]
    pub payment_stage: i32,
}

fn default_conflict_retries() -> u32 {
    3
}

fn default_payment_stage() -> i32 {
    1
}

impl Default for RefundConfig {
    fn default() -> Self {
        Self {
            conflict_retries: default_conflict_retries(),
            payment_stage: default_payment_stage(),
        }
    }
}

/// Outbound adapter for one acquiring gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway adapter service.
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

fn default_gateway_timeout() -> u64 {
    30
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PAYSETTLE").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
