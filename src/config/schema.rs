//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sync core.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the synchronization core.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Outbound HTTP settings.
    pub network: NetworkSettings,

    /// Retry configuration for idempotent reads.
    pub retries: RetryConfig,

    /// Account discovery settings.
    pub scan: ScanConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-family endpoint settings. A family without settings is not registered.
    pub families: FamiliesConfig,
}

/// Outbound HTTP settings shared by every family.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Deadline applied to each GET attempt in milliseconds.
    pub get_timeout_ms: u64,

    /// Deadline applied to non-idempotent calls in milliseconds.
    pub request_timeout_ms: u64,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            get_timeout_ms: 30_000,
            request_timeout_ms: 60_000,
            user_agent: concat!("chain-sync-core/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts for a GET (including the first one).
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 4_000,
        }
    }
}

/// Account discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of consecutive empty addresses tolerated when deep probing.
    pub gap_limit_deep: u32,

    /// Hard cap on derived indexes per scan.
    pub max_accounts: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            gap_limit_deep: 5,
            max_accounts: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Per-family settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FamiliesConfig {
    pub elrond: Option<ElrondConfig>,
    pub ethereum: Option<EthereumConfig>,
}

/// Elrond API endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElrondConfig {
    /// Public API (accounts, transactions, network config).
    pub api_url: String,

    /// Gateway used for confirmed transaction lookups.
    #[serde(default)]
    pub gateway_url: Option<String>,
}

/// Ethereum JSON-RPC and explorer endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EthereumConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Etherscan-compatible explorer API used for history.
    pub explorer_url: String,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 31337 for local Anvil).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    /// Gas price multiplier applied to the node's quote (e.g., 1.1 for 10% buffer).
    #[serde(default = "default_gas_price_multiplier")]
    pub gas_price_multiplier: f64,
}

fn default_chain_id() -> u64 {
    1
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_gas_price_multiplier() -> f64 {
    1.0
}
