//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs, chain parameters and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::blockchain::fees::GasPrice;
use crate::config::schema::AppConfig;
use crate::endpoints::Endpoint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let node = &config.node;
    if node.endpoints.is_empty() {
        errors.push(ValidationError::new("node.endpoints", "at least one endpoint is required"));
    }
    for (i, raw) in node.endpoints.iter().enumerate() {
        if let Err(e) = Endpoint::parse(raw) {
            errors.push(ValidationError::new(format!("node.endpoints[{}]", i), e.to_string()));
        }
    }
    if node.chain_id.trim().is_empty() {
        errors.push(ValidationError::new("node.chain_id", "must not be empty"));
    }
    if node.address_prefix.is_empty() || !node.address_prefix.chars().all(|c| c.is_ascii_lowercase()) {
        errors.push(ValidationError::new("node.address_prefix", "must be lowercase ascii letters"));
    }
    if node.request_timeout_secs == 0 {
        errors.push(ValidationError::new("node.request_timeout_secs", "must be greater than 0"));
    }
    if node.poll_interval_ms == 0 {
        errors.push(ValidationError::new("node.poll_interval_ms", "must be greater than 0"));
    }
    if node.inclusion_timeout_secs == 0 {
        errors.push(ValidationError::new("node.inclusion_timeout_secs", "must be greater than 0"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if config.retries.rotation_step == 0 {
        errors.push(ValidationError::new("retries.rotation_step", "must be at least 1"));
    }

    let fees = &config.fees;
    if let Err(e) = GasPrice::parse(&fees.gas_price, &fees.gas_denom) {
        errors.push(ValidationError::new("fees.gas_price", e.to_string()));
    }
    if fees.gas_denom.trim().is_empty() {
        errors.push(ValidationError::new("fees.gas_denom", "must not be empty"));
    }
    for (field, value) in [
        ("fees.send_gas_multiplier", fees.send_gas_multiplier),
        ("fees.multisend_gas_multiplier", fees.multisend_gas_multiplier),
    ] {
        if !value.is_finite() || value < 1.0 {
            errors.push(ValidationError::new(field, format!("{} must be >= 1.0", value)));
        }
    }

    if config.tokens.native_denom.trim().is_empty() {
        errors.push(ValidationError::new("tokens.native_denom", "must not be empty"));
    }
    if config.tokens.decimals > 18 {
        errors.push(ValidationError::new("tokens.decimals", "must be at most 18"));
    }

    let pct = config.settlement.fee_percentage;
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        errors.push(ValidationError::new(
            "settlement.fee_percentage",
            format!("{} is outside 0..=100", pct),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    let read_budget = u64::from(config.retries.max_attempts).saturating_mul(node.request_timeout_secs);
    if config.security.request_timeout_secs == 0 {
        errors.push(ValidationError::new("security.request_timeout_secs", "must be greater than 0"));
    } else if config.security.request_timeout_secs < read_budget {
        errors.push(ValidationError::new(
            "security.request_timeout_secs",
            format!(
                "{}s cannot cover {} attempts of {}s each",
                config.security.request_timeout_secs, config.retries.max_attempts, node.request_timeout_secs
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
