//! Pending operation tracking.
//!
//! # Responsibilities
//! - Compute the next safe sequence number given unconfirmed local sends
//! - Append an operation once broadcast produced a hash
//! - Drop pending entries once a sync observes them confirmed or superseded
//!
//! Entries are never dropped for any other reason; expiring stale pending
//! operations is left to the caller.

use std::collections::HashSet;

use crate::account::{Account, Operation, OperationType};
use crate::bridge::error::BroadcastError;

/// Next sequence number that will not collide with the account's own
/// unconfirmed sends.
///
/// `max(remote, 1 + max(pending sequence sent by this account))`, where the
/// second term collapses to `remote` when nothing is pending.
pub fn next_sequence(account: &Account) -> u64 {
    let remote = account.remote_sequence();
    account
        .pending_operations
        .iter()
        .filter(|op| op.op_type == OperationType::Out && op.is_sent_by(&account.address))
        .filter_map(|op| op.transaction_sequence_number)
        .max()
        .map_or(remote, |highest| remote.max(highest.saturating_add(1)))
}

/// New snapshot with `operation` recorded as pending (most recent first).
///
/// Refuses operations without a hash: a failed broadcast must leave no trace.
pub fn add_pending_operation(account: &Account, operation: Operation) -> Result<Account, BroadcastError> {
    if operation.hash.is_empty() {
        return Err(BroadcastError::MissingHash);
    }

    let mut pending = Vec::with_capacity(account.pending_operations.len() + 1);
    pending.extend(
        account
            .pending_operations
            .iter()
            .filter(|op| op.id != operation.id)
            .cloned(),
    );
    pending.insert(0, operation);

    Ok(Account {
        pending_operations: pending,
        ..account.clone()
    })
}

/// Pending entries still unconfirmed after a sync.
///
/// An entry is dropped when a confirmed operation shares its id or hash, or
/// when its sequence number is at or below one already consumed on chain
/// (`remote_sequence` has moved past it, or a confirmed send from the same
/// address used it).
pub fn reconcile_pending(
    pending: &[Operation],
    confirmed: &[Operation],
    address: &str,
    remote_sequence: u64,
) -> Vec<Operation> {
    if pending.is_empty() {
        return Vec::new();
    }

    let confirmed_ids: HashSet<&str> = confirmed.iter().map(|op| op.id.as_str()).collect();
    let confirmed_hashes: HashSet<&str> = confirmed
        .iter()
        .filter(|op| !op.hash.is_empty())
        .map(|op| op.hash.as_str())
        .collect();
    let highest_confirmed_sequence = confirmed
        .iter()
        .filter(|op| op.op_type == OperationType::Out && op.is_sent_by(address))
        .filter_map(|op| op.transaction_sequence_number)
        .max();

    pending
        .iter()
        .filter(|op| {
            if confirmed_ids.contains(op.id.as_str()) || confirmed_hashes.contains(op.hash.as_str()) {
                tracing::debug!(id = %op.id, "Pending operation confirmed");
                return false;
            }
            let superseded = op.is_sent_by(address)
                && op.transaction_sequence_number.is_some_and(|seq| {
                    seq < remote_sequence || highest_confirmed_sequence.is_some_and(|c| seq <= c)
                });
            if superseded {
                tracing::debug!(id = %op.id, "Pending operation superseded by confirmed sequence");
            }
            !superseded
        })
        .cloned()
        .collect()
}
