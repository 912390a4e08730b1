//! Account and operation types.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amounts in the chain's smallest unit.
pub type Amount = U256;

/// Supported chain families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FamilyTag {
    Elrond,
    Ethereum,
}

impl FamilyTag {
    pub const ALL: [FamilyTag; 2] = [FamilyTag::Elrond, FamilyTag::Ethereum];

    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyTag::Elrond => "elrond",
            FamilyTag::Ethereum => "ethereum",
        }
    }
}

impl fmt::Display for FamilyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamilyTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FamilyTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown family '{}'", s))
    }
}

/// Direction of an operation relative to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    In,
    Out,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::In => "IN",
            OperationType::Out => "OUT",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confirmed or pending balance movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Deterministic identity: account id + hash + direction.
    pub id: String,
    /// Transaction hash; empty until broadcast for optimistic operations.
    pub hash: String,
    pub account_id: String,
    pub op_type: OperationType,
    /// Balance impact (value + fee for OUT).
    pub value: Amount,
    pub fee: Amount,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
    pub date: DateTime<Utc>,
    /// None while unconfirmed.
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    /// Sender nonce, set on OUT operations only.
    pub transaction_sequence_number: Option<u64>,
    pub has_failed: bool,
}

impl Operation {
    /// True once the operation has been observed in a block.
    pub fn is_confirmed(&self) -> bool {
        self.block_height.is_some()
    }

    /// True if `address` appears among the senders.
    pub fn is_sent_by(&self, address: &str) -> bool {
        self.senders.iter().any(|s| s == address)
    }
}

/// Elrond account resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElrondResources {
    /// Remote-reported account nonce.
    pub nonce: u64,
}

/// Ethereum account resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EthereumResources {
    /// Remote-reported transaction count.
    pub nonce: u64,
}

/// Family-specific account state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyResources {
    Elrond(ElrondResources),
    Ethereum(EthereumResources),
}

impl FamilyResources {
    /// Resources for `family` holding a freshly fetched sequence.
    pub fn with_sequence(family: FamilyTag, sequence: u64) -> Self {
        match family {
            FamilyTag::Elrond => FamilyResources::Elrond(ElrondResources { nonce: sequence }),
            FamilyTag::Ethereum => FamilyResources::Ethereum(EthereumResources { nonce: sequence }),
        }
    }

    /// Remote-reported next sequence number.
    pub fn sequence(&self) -> u64 {
        match self {
            FamilyResources::Elrond(r) => r.nonce,
            FamilyResources::Ethereum(r) => r.nonce,
        }
    }

    pub fn family(&self) -> FamilyTag {
        match self {
            FamilyResources::Elrond(_) => FamilyTag::Elrond,
            FamilyResources::Ethereum(_) => FamilyTag::Ethereum,
        }
    }
}

/// An immutable account snapshot. Each sync produces a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub family: FamilyTag,
    pub address: String,
    pub derivation_index: u32,
    pub balance: Amount,
    pub spendable_balance: Amount,
    pub block_height: u64,
    pub operations_count: usize,
    /// Sorted by date descending.
    pub operations: Vec<Operation>,
    /// Locally broadcast, not yet confirmed. Most recent first.
    pub pending_operations: Vec<Operation>,
    pub last_sync_date: DateTime<Utc>,
    pub resources: FamilyResources,
}

impl Account {
    /// Remote-reported sequence from the family resources.
    pub fn remote_sequence(&self) -> u64 {
        self.resources.sequence()
    }

    /// Zero balance and no history: the discovery halt condition.
    pub fn is_empty(&self) -> bool {
        self.balance.is_zero() && self.operations_count == 0
    }

    /// Date of the most recent known operation.
    pub fn last_operation_date(&self) -> Option<DateTime<Utc>> {
        self.operations.first().map(|op| op.date)
    }
}
