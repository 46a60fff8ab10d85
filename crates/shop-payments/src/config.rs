//! # Gateway Configuration
//!
//! Configuration for the redirect payment gateway. Secrets come from
//! environment variables.

use shop_core::{ShopError, ShopResult};
use std::env;

/// Redirect gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the approval page (customer is redirected here)
    pub base_url: String,

    /// Shared secret for signing approval URLs and verifying callbacks
    pub callback_secret: String,

    /// Allowed clock skew on callback timestamps, in seconds
    pub signature_tolerance_secs: i64,
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GATEWAY_BASE_URL`
    /// - `GATEWAY_CALLBACK_SECRET`
    pub fn from_env() -> ShopResult<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let base_url = env::var("GATEWAY_BASE_URL")
            .map_err(|_| ShopError::Configuration("GATEWAY_BASE_URL not set".to_string()))?;

        let callback_secret = env::var("GATEWAY_CALLBACK_SECRET").map_err(|_| {
            ShopError::Configuration("GATEWAY_CALLBACK_SECRET not set".to_string())
        })?;

        if callback_secret.len() < 16 {
            return Err(ShopError::Configuration(
                "GATEWAY_CALLBACK_SECRET must be at least 16 characters".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            callback_secret,
            signature_tolerance_secs: 300,
        })
    }

    /// Construct directly (tests, embedded setups)
    pub fn new(base_url: impl Into<String>, callback_secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            callback_secret: callback_secret.into(),
            signature_tolerance_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_config() {
        let config = GatewayConfig::new("https://gateway.example", "secret-0123456789");
        assert_eq!(config.base_url, "https://gateway.example");
        assert_eq!(config.signature_tolerance_secs, 300);
    }
}
