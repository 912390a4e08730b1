//! Account shape resolution.
//!
//! One incremental fetch of balance, sequence, height and new history for an
//! address, merged with the cached operations of the prior snapshot.
//!
//! Calls are strictly sequential: balance, then sequence, then height, then
//! history. Families rely on that ordering.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::account::{
    encode_operation_id, Account, Amount, FamilyResources, FamilyTag, Operation, OperationType,
};
use crate::chain::{ChainApiClient, RawTransaction};
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::merger::merge_operations;

/// The subset of account state produced by one resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountShape {
    pub id: String,
    pub balance: Amount,
    pub spendable_balance: Amount,
    pub block_height: u64,
    pub resources: FamilyResources,
    pub operations_count: usize,
    /// Prior and fresh operations merged, date descending.
    pub operations: Vec<Operation>,
}

/// Map a chain history entry to an operation of `account_id`.
///
/// A self-send is reported once, as OUT.
pub fn raw_to_operation(account_id: &str, address: &str, tx: &RawTransaction) -> Operation {
    let is_sender = tx.sender == address;
    let op_type = if is_sender { OperationType::Out } else { OperationType::In };

    Operation {
        id: encode_operation_id(account_id, &tx.hash, op_type),
        hash: tx.hash.clone(),
        account_id: account_id.to_string(),
        op_type,
        value: if is_sender {
            tx.value.saturating_add(tx.fee)
        } else {
            tx.value
        },
        fee: tx.fee,
        senders: vec![tx.sender.clone()],
        recipients: tx.receiver.iter().cloned().collect(),
        date: tx.timestamp,
        block_height: tx.block_height,
        block_hash: tx.block_hash.clone(),
        transaction_sequence_number: is_sender.then_some(tx.nonce),
        has_failed: tx.status.is_failure(),
    }
}

/// Lower bound for an incremental history fetch.
///
/// Just after the newest known operation, unless some operation is still
/// awaiting a block: then the oldest such operation's date, inclusive, so it
/// is fetched again until its confirmation shows up. Failed operations never
/// hold the cursor back.
pub fn history_cursor(prior_operations: &[Operation]) -> Option<DateTime<Utc>> {
    let oldest_unconfirmed = prior_operations
        .iter()
        .filter(|op| !op.is_confirmed() && !op.has_failed)
        .map(|op| op.date)
        .min();

    oldest_unconfirmed.or_else(|| {
        prior_operations
            .first()
            .map(|op| op.date + Duration::milliseconds(1))
    })
}

/// Resolves account shapes for one family through its injected API client.
#[derive(Clone)]
pub struct AccountShapeResolver {
    api: Arc<dyn ChainApiClient>,
    family: FamilyTag,
}

impl AccountShapeResolver {
    pub fn new(api: Arc<dyn ChainApiClient>, family: FamilyTag) -> Self {
        Self { api, family }
    }

    pub fn family(&self) -> FamilyTag {
        self.family
    }

    /// Fetch the current shape of `address`.
    ///
    /// With a prior snapshot only history newer than its latest operation is
    /// requested; without one the full history is fetched. An address with
    /// no remote activity yields a zero balance and no operations.
    pub async fn resolve(
        &self,
        account_id: &str,
        address: &str,
        initial: Option<&Account>,
    ) -> SyncResult<AccountShape> {
        let prior_operations: &[Operation] = initial.map(|a| a.operations.as_slice()).unwrap_or(&[]);
        let since = history_cursor(prior_operations);

        tracing::debug!(
            family = %self.family,
            account_id = %account_id,
            since = ?since,
            prior_operations = prior_operations.len(),
            "Resolving account shape"
        );

        let balance = self
            .api
            .get_balance(address)
            .await
            .map_err(SyncError::network("get_balance"))?;
        let sequence = self
            .api
            .get_sequence(address)
            .await
            .map_err(SyncError::network("get_sequence"))?;
        let block_height = self
            .api
            .get_block_height()
            .await
            .map_err(SyncError::network("get_block_height"))?;
        let history = self
            .api
            .get_history(address, since)
            .await
            .map_err(SyncError::network("get_history"))?;

        let fresh: Vec<Operation> = history
            .iter()
            .map(|tx| raw_to_operation(account_id, address, tx))
            .collect();
        let operations = merge_operations(prior_operations, &fresh);

        tracing::debug!(
            family = %self.family,
            account_id = %account_id,
            fetched = fresh.len(),
            total = operations.len(),
            block_height = block_height,
            "Account shape resolved"
        );

        Ok(AccountShape {
            id: account_id.to_string(),
            balance,
            spendable_balance: balance,
            block_height,
            resources: FamilyResources::with_sequence(self.family, sequence),
            operations_count: operations.len(),
            operations,
        })
    }
}

impl std::fmt::Debug for AccountShapeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountShapeResolver")
            .field("family", &self.family)
            .finish()
    }
}
