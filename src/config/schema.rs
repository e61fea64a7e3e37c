//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the payout relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Node endpoints and chain parameters.
    pub node: NodeConfig,

    /// Failover attempt bound and rotation step.
    pub retries: RetryConfig,

    /// Gas price and per-operation safety factors.
    pub fees: FeeConfig,

    /// Token → denom table.
    pub tokens: TokenConfig,

    /// Betting round settlement.
    pub settlement: SettlementConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3001".to_string(),
        }
    }
}

/// Node access configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// REST gateway URLs in rotation order. The first is the primary.
    pub endpoints: Vec<String>,

    /// Chain ID signed into every transaction.
    pub chain_id: String,

    /// Bech32 prefix addresses must carry.
    pub address_prefix: String,

    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,

    /// Delay between inclusion lookups in milliseconds.
    pub poll_interval_ms: u64,

    /// How long to wait for a broadcast to land in a block.
    pub inclusion_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://lcd.osmosis.zone".to_string(),
                "https://osmosis-api.polkachu.com".to_string(),
                "https://osmosis-api.quickapi.com".to_string(),
            ],
            chain_id: "osmosis-1".to_string(),
            address_prefix: "osmo".to_string(),
            request_timeout_secs: 10,
            poll_interval_ms: 1000,
            inclusion_timeout_secs: 60,
        }
    }
}

/// Failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per operation, including the first.
    pub max_attempts: u32,

    /// Endpoints skipped per rotation.
    pub rotation_step: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rotation_step: 1,
        }
    }
}

/// Fee configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Fixed gas price as decimal text (parsed exactly).
    pub gas_price: String,

    /// Denom fees are paid in.
    pub gas_denom: String,

    /// Safety factor applied to simulated gas for a single send.
    pub send_gas_multiplier: f64,

    /// Safety factor applied to simulated gas for a multisend.
    pub multisend_gas_multiplier: f64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            gas_price: "0.025".to_string(),
            gas_denom: "uosmo".to_string(),
            send_gas_multiplier: 1.3,
            multisend_gas_multiplier: 1.4,
        }
    }
}

/// Token table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Native gas token symbol.
    pub native_token: String,

    /// Denom of the native token.
    pub native_denom: String,

    /// Decimal places between human and base units.
    pub decimals: u32,

    /// Extra token symbol → denom entries.
    pub extra: BTreeMap<String, String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        let mut extra = BTreeMap::new();
        extra.insert(
            "lab".to_string(),
            "factory/osmo17fel472lgzs87ekt9dvk0zqyh5gl80sqp4sk4n/LAB".to_string(),
        );
        Self {
            native_token: "osmo".to_string(),
            native_denom: "uosmo".to_string(),
            decimals: 6,
            extra,
        }
    }
}

/// Settlement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// House share of each pool, in percent.
    pub fee_percentage: f64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { fee_percentage: 5.0 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Deadline in seconds for read-only requests (`/health`, `/balance`).
    /// Transfers are bounded by the retry settings instead.
    pub request_timeout_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 256 * 1024,
            request_timeout_secs: 120,
        }
    }
}
