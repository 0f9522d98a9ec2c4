use log::*;
use shop_common::Secret;

pub const DEFAULT_BASE_URL: &str = "https://api-merchant.payos.vn";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct PayOsConfig {
    pub client_id: String,
    pub api_key: Secret<String>,
    /// Signs outgoing payment requests and authenticates incoming webhooks.
    pub checksum_key: Secret<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PayOsConfig {
    fn default() -> Self {
        Self {
            client_id: String::default(),
            api_key: Secret::default(),
            checksum_key: Secret::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PayOsConfig {
    pub fn new_from_env_or_default() -> Self {
        let client_id = std::env::var("PAYOS_CLIENT_ID").unwrap_or_else(|_| {
            warn!("PAYOS_CLIENT_ID not set, using (probably useless) default");
            "00000000-0000-0000-0000-000000000000".to_string()
        });
        let api_key = Secret::from_env_or("PAYOS_API_KEY", "00000000-0000-0000-0000-000000000000");
        let checksum_key = Secret::from_env_or("PAYOS_CHECKSUM_KEY", "0000000000000000");
        let base_url = std::env::var("PAYOS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("PAYOS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { client_id, api_key, checksum_key, base_url, timeout_secs }
    }
}
