//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ConfigValidationError>>

use std::fmt;

use crate::config::schema::SyncConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// Human readable reason.
    pub reason: String,
}

impl ConfigValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

fn check_url(field: &str, value: &str, errors: &mut Vec<ConfigValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ConfigValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ConfigValidationError::new(field, format!("invalid URL: {}", e))),
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    if config.network.get_timeout_ms == 0 {
        errors.push(ConfigValidationError::new("network.get_timeout_ms", "must be > 0"));
    }
    if config.network.request_timeout_ms == 0 {
        errors.push(ConfigValidationError::new("network.request_timeout_ms", "must be > 0"));
    }
    if config.retries.max_attempts == 0 {
        errors.push(ConfigValidationError::new("retries.max_attempts", "must be >= 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ConfigValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }
    if config.scan.max_accounts == 0 {
        errors.push(ConfigValidationError::new("scan.max_accounts", "must be >= 1"));
    }

    if let Some(elrond) = &config.families.elrond {
        check_url("families.elrond.api_url", &elrond.api_url, &mut errors);
        if let Some(gateway) = &elrond.gateway_url {
            check_url("families.elrond.gateway_url", gateway, &mut errors);
        }
    }

    if let Some(eth) = &config.families.ethereum {
        check_url("families.ethereum.rpc_url", &eth.rpc_url, &mut errors);
        for (i, failover) in eth.failover_urls.iter().enumerate() {
            check_url(&format!("families.ethereum.failover_urls[{}]", i), failover, &mut errors);
        }
        check_url("families.ethereum.explorer_url", &eth.explorer_url, &mut errors);
        if eth.rpc_timeout_secs == 0 {
            errors.push(ConfigValidationError::new(
                "families.ethereum.rpc_timeout_secs",
                "must be > 0",
            ));
        }
        if !(eth.gas_price_multiplier.is_finite() && eth.gas_price_multiplier > 0.0) {
            errors.push(ConfigValidationError::new(
                "families.ethereum.gas_price_multiplier",
                "must be a positive number",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
