//! Persisted account form.
//!
//! The caller owns storage. These pure functions convert between the live
//! [`Account`] and a JSON-compatible shape: amounts as decimal strings,
//! dates as RFC 3339, family resources as plain scalars.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::account::amount::parse_decimal;
use crate::account::types::{
    Account, Amount, ElrondResources, EthereumResources, FamilyResources, FamilyTag, Operation,
    OperationType,
};

/// Errors when restoring an account from its persisted form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RawAccountError {
    #[error("Invalid amount in {field}: '{value}'")]
    InvalidAmount { field: &'static str, value: String },

    #[error("Resources for {resources} stored on a {account} account")]
    FamilyMismatch { account: FamilyTag, resources: FamilyTag },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRaw {
    pub id: String,
    pub hash: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub value: String,
    pub fee: String,
    pub senders: Vec<String>,
    pub recipients: Vec<String>,
    pub date: DateTime<Utc>,
    pub block_height: Option<u64>,
    pub block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_sequence_number: Option<u64>,
    #[serde(default)]
    pub has_failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum FamilyResourcesRaw {
    Elrond { nonce: u64 },
    Ethereum { nonce: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRaw {
    pub id: String,
    pub family: FamilyTag,
    pub address: String,
    pub derivation_index: u32,
    pub balance: String,
    pub spendable_balance: String,
    pub block_height: u64,
    pub operations_count: usize,
    pub operations: Vec<OperationRaw>,
    #[serde(default)]
    pub pending_operations: Vec<OperationRaw>,
    pub last_sync_date: DateTime<Utc>,
    pub resources: FamilyResourcesRaw,
}

fn parse_amount(field: &'static str, value: &str) -> Result<Amount, RawAccountError> {
    parse_decimal(value).ok_or_else(|| RawAccountError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

pub fn to_resources_raw(resources: &FamilyResources) -> FamilyResourcesRaw {
    match resources {
        FamilyResources::Elrond(r) => FamilyResourcesRaw::Elrond { nonce: r.nonce },
        FamilyResources::Ethereum(r) => FamilyResourcesRaw::Ethereum { nonce: r.nonce },
    }
}

pub fn from_resources_raw(raw: &FamilyResourcesRaw) -> FamilyResources {
    match raw {
        FamilyResourcesRaw::Elrond { nonce } => FamilyResources::Elrond(ElrondResources { nonce: *nonce }),
        FamilyResourcesRaw::Ethereum { nonce } => {
            FamilyResources::Ethereum(EthereumResources { nonce: *nonce })
        }
    }
}

pub fn to_operation_raw(op: &Operation) -> OperationRaw {
    OperationRaw {
        id: op.id.clone(),
        hash: op.hash.clone(),
        account_id: op.account_id.clone(),
        op_type: op.op_type,
        value: op.value.to_string(),
        fee: op.fee.to_string(),
        senders: op.senders.clone(),
        recipients: op.recipients.clone(),
        date: op.date,
        block_height: op.block_height,
        block_hash: op.block_hash.clone(),
        transaction_sequence_number: op.transaction_sequence_number,
        has_failed: op.has_failed,
    }
}

pub fn from_operation_raw(raw: &OperationRaw) -> Result<Operation, RawAccountError> {
    Ok(Operation {
        id: raw.id.clone(),
        hash: raw.hash.clone(),
        account_id: raw.account_id.clone(),
        op_type: raw.op_type,
        value: parse_amount("operation.value", &raw.value)?,
        fee: parse_amount("operation.fee", &raw.fee)?,
        senders: raw.senders.clone(),
        recipients: raw.recipients.clone(),
        date: raw.date,
        block_height: raw.block_height,
        block_hash: raw.block_hash.clone(),
        transaction_sequence_number: raw.transaction_sequence_number,
        has_failed: raw.has_failed,
    })
}

pub fn to_account_raw(account: &Account) -> AccountRaw {
    AccountRaw {
        id: account.id.clone(),
        family: account.family,
        address: account.address.clone(),
        derivation_index: account.derivation_index,
        balance: account.balance.to_string(),
        spendable_balance: account.spendable_balance.to_string(),
        block_height: account.block_height,
        operations_count: account.operations_count,
        operations: account.operations.iter().map(to_operation_raw).collect(),
        pending_operations: account.pending_operations.iter().map(to_operation_raw).collect(),
        last_sync_date: account.last_sync_date,
        resources: to_resources_raw(&account.resources),
    }
}

pub fn from_account_raw(raw: &AccountRaw) -> Result<Account, RawAccountError> {
    let resources = from_resources_raw(&raw.resources);
    if resources.family() != raw.family {
        return Err(RawAccountError::FamilyMismatch {
            account: raw.family,
            resources: resources.family(),
        });
    }

    Ok(Account {
        id: raw.id.clone(),
        family: raw.family,
        address: raw.address.clone(),
        derivation_index: raw.derivation_index,
        balance: parse_amount("balance", &raw.balance)?,
        spendable_balance: parse_amount("spendableBalance", &raw.spendable_balance)?,
        block_height: raw.block_height,
        operations_count: raw.operations_count,
        operations: raw
            .operations
            .iter()
            .map(from_operation_raw)
            .collect::<Result<_, _>>()?,
        pending_operations: raw
            .pending_operations
            .iter()
            .map(from_operation_raw)
            .collect::<Result<_, _>>()?,
        last_sync_date: raw.last_sync_date,
        resources,
    })
}
