//! Identity helpers for accounts and operations.

use crate::account::types::{FamilyTag, Operation, OperationType};

/// Deterministic account id for `address` in `family`.
pub fn encode_account_id(family: FamilyTag, address: &str) -> String {
    format!("js:2:{}:{}:", family, address)
}

/// Deterministic operation id: account id + tx hash + direction.
pub fn encode_operation_id(account_id: &str, hash: &str, op_type: OperationType) -> String {
    format!("{}-{}-{}", account_id, hash, op_type)
}

/// Attach a broadcast hash to an optimistic operation, re-deriving its id.
pub fn patch_operation_with_hash(operation: &Operation, hash: &str) -> Operation {
    Operation {
        id: encode_operation_id(&operation.account_id, hash, operation.op_type),
        hash: hash.to_string(),
        ..operation.clone()
    }
}
