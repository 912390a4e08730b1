//! Normalized chain data exchanged with family API clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Amount;

/// Fee-relevant network parameters. Fetched per use, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: String,
    /// Price per gas unit in the smallest denomination.
    #[serde(with = "crate::account::amount::decimal")]
    pub gas_price: Amount,
    /// Minimum gas limit for a plain transfer.
    pub gas_limit: u64,
    /// Decimal places of the native unit.
    pub denomination: u32,
}

/// Execution status reported by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawTransactionStatus {
    Success,
    Pending,
    Fail,
    Invalid,
    /// The chain reported no status at all.
    Unknown,
    /// A status this core does not interpret.
    Other,
}

impl RawTransactionStatus {
    /// Failed, invalid and status-less entries count as failed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RawTransactionStatus::Fail | RawTransactionStatus::Invalid | RawTransactionStatus::Unknown
        )
    }
}

/// A history entry as returned by a family API, before mapping to an Operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: String,
    pub sender: String,
    pub receiver: Option<String>,
    pub value: Amount,
    pub fee: Amount,
    pub timestamp: DateTime<Utc>,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    pub nonce: u64,
    pub status: RawTransactionStatus,
}

/// Result of submitting a signed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub hash: String,
}

/// Inclusion data for a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub block_height: u64,
    pub block_hash: String,
}
