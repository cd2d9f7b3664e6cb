//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Endpoint must be an absolute http(s) URL
//! - Log level must be a known level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: UnisonConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::UnisonConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &UnisonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.server.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError {
            field: "server.endpoint",
            message: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field: "server.endpoint",
            message: format!("invalid URL '{}': {}", config.server.endpoint, e),
        }),
    }

    if config.blockchain.receipt_timeout_secs == Some(0) {
        errors.push(ValidationError {
            field: "blockchain.receipt_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!("unknown level '{}'", config.observability.log_level),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
