//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or UnisonConfig::default()
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → UnisonConfig (validated, immutable)
//!     → handed to UnisonClient::new
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets (API key, private key) are never part of the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BlockchainConfig, ObservabilityConfig, ServerConfig, UnisonConfig, DEFAULT_ENDPOINT};
