//! Server configuration.
//!
//! All configuration is read from environment variables (with `.env` support via `dotenvy` in the binary). Missing
//! values fall back to defaults that work for local development and log a warning.
use log::*;
use payos_gateway::PayOsConfig;

pub const DEFAULT_PORT: u16 = 8360;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Where the gateway sends the shopper after a successful payment.
    pub success_url: String,
    /// Where the gateway sends the shopper after an abandoned or failed payment.
    pub cancel_url: String,
    pub payos: PayOsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_url: String::default(),
            success_url: "http://localhost:8360/payment/success".to_string(),
            cancel_url: "http://localhost:8360/payment/cancel".to_string(),
            payos: PayOsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16, database_url: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            database_url: database_url.to_string(),
            ..ServerConfig::default()
        }
    }

    pub fn from_env_or_default() -> Self {
        let host = std::env::var("MPS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("MPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("{s} is not a valid port for MPS_PORT. {e} Using the default, {DEFAULT_PORT}, instead.");
                    DEFAULT_PORT
                })
            })
            .unwrap_or(DEFAULT_PORT);
        let database_url = std::env::var("MPS_DATABASE_URL").unwrap_or_else(|_| {
            warn!("MPS_DATABASE_URL not set. Using the default sqlite database");
            "sqlite://data/shop_store.db".to_string()
        });
        let success_url = std::env::var("MPS_SUCCESS_URL")
            .unwrap_or_else(|_| format!("http://localhost:{DEFAULT_PORT}/payment/success"));
        let cancel_url = std::env::var("MPS_CANCEL_URL")
            .unwrap_or_else(|_| format!("http://localhost:{DEFAULT_PORT}/payment/cancel"));
        let payos = PayOsConfig::new_from_env_or_default();
        Self { host, port, database_url, success_url, cancel_url, payos }
    }
}
