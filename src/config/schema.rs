//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Default GraphQL endpoint of the project registry.
pub const DEFAULT_ENDPOINT: &str = "https://data-unison.covestlabs.com/graphql";

/// Root configuration for the SDK.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UnisonConfig {
    /// Project registry settings.
    pub server: ServerConfig,

    /// Contract-call settings.
    pub blockchain: BlockchainConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Project registry (GraphQL) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// GraphQL endpoint URL.
    pub endpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Contract-call configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// Number of block confirmations awaited after each write.
    pub confirmation_blocks: u64,

    /// Upper bound on the wait for a receipt. `None` waits indefinitely.
    pub receipt_timeout_secs: Option<u64>,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            confirmation_blocks: 1,
            receipt_timeout_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UnisonConfig::default();
        assert_eq!(config.server.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.blockchain.confirmation_blocks, 1);
        assert!(config.blockchain.receipt_timeout_secs.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_partial_toml() {
        let config: UnisonConfig = toml::from_str(
            r#"
            [server]
            endpoint = "http://localhost:4000/graphql"

            [blockchain]
            receipt_timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.server.endpoint, "http://localhost:4000/graphql");
        assert_eq!(config.blockchain.confirmation_blocks, 1);
        assert_eq!(config.blockchain.receipt_timeout_secs, Some(120));
    }
}
