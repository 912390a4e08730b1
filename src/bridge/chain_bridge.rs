//! Generic account bridge.
//!
//! One implementation of [`AccountBridge`] shared by every family; the
//! differences live in a [`FamilySpec`] and the injected [`ChainApiClient`].

use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Instant;

use crate::account::{
    encode_account_id, encode_operation_id, patch_operation_with_hash, Account, Amount, FamilyTag,
    Operation, OperationType,
};
use crate::bridge::error::{BridgeError, BridgeResult, BroadcastError, ValidationError};
use crate::bridge::family::FamilySpec;
use crate::bridge::transaction::{
    FeeBasis, FeeQuote, SignedOperation, Transaction, TransactionPatch, TransactionStatus,
    UnsignedPayload,
};
use crate::bridge::{AccountBridge, AddressDeriver, DerivationContext};
use crate::chain::ChainApiClient;
use crate::config::ScanConfig;
use crate::observability::metrics;
use crate::sync::pending::{next_sequence, reconcile_pending};
use crate::sync::resolver::{AccountShape, AccountShapeResolver};
use crate::sync::{SyncError, SyncResult};

/// Bridge for one family.
pub struct ChainBridge<F: FamilySpec> {
    family: F,
    api: Arc<dyn ChainApiClient>,
    resolver: AccountShapeResolver,
    scan: ScanConfig,
}

#[derive(Debug, Clone, Copy, Default)]
struct ScanProgress {
    index: u32,
    empty_run: u32,
    done: bool,
}

impl<F: FamilySpec> ChainBridge<F> {
    pub fn new(family: F, api: Arc<dyn ChainApiClient>, scan: ScanConfig) -> Self {
        let resolver = AccountShapeResolver::new(api.clone(), family.tag());
        Self {
            family,
            api,
            resolver,
            scan,
        }
    }

    pub fn family_spec(&self) -> &F {
        &self.family
    }

    fn account_from_shape(
        &self,
        shape: AccountShape,
        address: String,
        derivation_index: u32,
        pending_operations: Vec<Operation>,
    ) -> Account {
        Account {
            id: shape.id,
            family: self.family.tag(),
            address,
            derivation_index,
            balance: shape.balance,
            spendable_balance: shape.spendable_balance,
            block_height: shape.block_height,
            operations_count: shape.operations_count,
            operations: shape.operations,
            pending_operations,
            last_sync_date: Utc::now(),
            resources: shape.resources,
        }
    }

    async fn discover(&self, deriver: &dyn AddressDeriver, index: u32) -> SyncResult<Account> {
        let tag = self.family.tag();
        let derived = deriver
            .derive_address(tag, index)
            .await
            .map_err(|reason| SyncError::Derivation { index, reason })?;
        let address = self.family.normalize_address(&derived);
        let account_id = encode_account_id(tag, &address);

        let shape = self.resolver.resolve(&account_id, &address, None).await?;
        let account = self.account_from_shape(shape, address, index, Vec::new());
        Ok(self.family.post_sync(None, account))
    }

    fn check_transaction_family(&self, transaction: &Transaction) -> BridgeResult<()> {
        if transaction.family != self.family.tag() {
            return Err(BridgeError::FamilyMismatch {
                transaction: transaction.family,
                bridge: self.family.tag(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<F: FamilySpec> AccountBridge for ChainBridge<F> {
    fn family(&self) -> FamilyTag {
        self.family.tag()
    }

    fn scan_accounts<'a>(&'a self, context: DerivationContext) -> BoxStream<'a, SyncResult<Account>> {
        let gap_limit = self.scan.gap_limit_deep.max(1);
        let max_accounts = self.scan.max_accounts;

        stream::unfold((context, ScanProgress::default()), move |(context, mut progress)| async move {
            if progress.done || progress.index >= max_accounts {
                return None;
            }
            let index = progress.index;
            progress.index += 1;

            let item = self.discover(context.deriver.as_ref(), index).await;
            match &item {
                Ok(account) if account.is_empty() => {
                    progress.empty_run += 1;
                    if !context.deep || progress.empty_run >= gap_limit {
                        progress.done = true;
                    }
                }
                Ok(_) => progress.empty_run = 0,
                Err(err) => {
                    tracing::warn!(family = %self.family.tag(), index = index, error = %err, "Account discovery aborted");
                    progress.done = true;
                }
            }
            if progress.done {
                tracing::info!(family = %self.family.tag(), discovered = index + 1, "Account discovery finished");
            }
            Some((item, (context, progress)))
        })
        .boxed()
    }

    async fn sync(&self, account: &Account) -> SyncResult<Account> {
        let tag = self.family.tag();
        if account.family != tag {
            return Err(SyncError::FamilyMismatch {
                account: account.family,
                bridge: tag,
            });
        }

        let start = Instant::now();
        let shape = match self
            .resolver
            .resolve(&account.id, &account.address, Some(account))
            .await
        {
            Ok(shape) => shape,
            Err(err) => {
                metrics::record_sync(tag.as_str(), "error", start);
                tracing::warn!(account_id = %account.id, error = %err, "Account sync failed");
                return Err(err);
            }
        };

        let pending = if account.pending_operations.is_empty() {
            Vec::new()
        } else {
            let settled: Vec<Operation> = shape
                .operations
                .iter()
                .filter(|op| op.is_confirmed() || op.has_failed)
                .cloned()
                .collect();
            reconcile_pending(
                &account.pending_operations,
                &settled,
                &account.address,
                shape.resources.sequence(),
            )
        };

        let synced = self.account_from_shape(shape, account.address.clone(), account.derivation_index, pending);
        let synced = self.family.post_sync(Some(account), synced);

        metrics::record_sync(tag.as_str(), "success", start);
        tracing::info!(
            account_id = %synced.id,
            block_height = synced.block_height,
            operations = synced.operations_count,
            pending = synced.pending_operations.len(),
            "Account synced"
        );
        Ok(synced)
    }

    fn create_transaction(&self) -> Transaction {
        Transaction::new(self.family.tag())
    }

    fn update_transaction(&self, transaction: &Transaction, patch: TransactionPatch) -> Transaction {
        patch.apply(transaction)
    }

    async fn prepare_transaction(&self, account: &Account, transaction: &Transaction) -> BridgeResult<Transaction> {
        self.check_transaction_family(transaction)?;
        let mut prepared = transaction.clone();

        if !transaction.is_prepared() {
            let config = self
                .api
                .get_network_config()
                .await
                .map_err(BridgeError::network("get_network_config"))?;
            let fees = self.family.estimate_fees(&config, transaction);
            tracing::debug!(family = %self.family.tag(), fees = %fees, "Estimated fees");
            prepared.fees = Some(fees);
            prepared.fee_quote = Some(FeeQuote {
                gas_limit: self.family.gas_limit(&config, transaction),
                chain_id: config.chain_id,
                gas_price: config.gas_price,
                basis: FeeBasis::of(transaction),
            });
        }

        if prepared.use_all_amount {
            let fees = prepared.fees.unwrap_or_default();
            prepared.amount = account.spendable_balance.saturating_sub(fees);
        }

        Ok(prepared)
    }

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if transaction.recipient.is_empty() {
            errors.push(ValidationError::RecipientRequired);
        } else if !self.family.is_valid_address(&transaction.recipient) {
            errors.push(ValidationError::InvalidAddress(transaction.recipient.clone()));
        } else if self.family.normalize_address(&transaction.recipient) == account.address {
            errors.push(ValidationError::SameRecipient);
        }

        let estimated_fees = match transaction.fees {
            Some(fees) => fees,
            None => {
                warnings.push("fees are not estimated yet".to_string());
                Amount::ZERO
            }
        };

        let amount = if transaction.use_all_amount {
            account.spendable_balance.saturating_sub(estimated_fees)
        } else {
            transaction.amount
        };

        let total_spent = match amount.checked_add(estimated_fees) {
            Some(total) if !amount.is_zero() => {
                if total > account.spendable_balance {
                    errors.push(ValidationError::InsufficientFunds {
                        needed: total,
                        available: account.spendable_balance,
                    });
                }
                total
            }
            _ => {
                errors.push(ValidationError::AmountOutOfRange { amount });
                amount.saturating_add(estimated_fees)
            }
        };

        TransactionStatus {
            errors,
            warnings,
            estimated_fees,
            amount,
            total_spent,
        }
    }

    fn build_unsigned(&self, account: &Account, transaction: &Transaction) -> BridgeResult<(UnsignedPayload, Operation)> {
        self.check_transaction_family(transaction)?;
        if !transaction.is_prepared() {
            return Err(BridgeError::NotPrepared);
        }

        let status = self.get_transaction_status(account, transaction);
        if let Some(err) = status.errors.into_iter().next() {
            return Err(err.into());
        }

        let sequence = next_sequence(account);
        let mut bound = transaction.clone();
        bound.amount = status.amount;

        let operation = Operation {
            id: encode_operation_id(&account.id, "", OperationType::Out),
            hash: String::new(),
            account_id: account.id.clone(),
            op_type: OperationType::Out,
            value: status.total_spent,
            fee: status.estimated_fees,
            senders: vec![account.address.clone()],
            recipients: vec![self.family.normalize_address(&bound.recipient)],
            date: Utc::now(),
            block_height: None,
            block_hash: None,
            transaction_sequence_number: Some(sequence),
            has_failed: false,
        };

        let payload = UnsignedPayload {
            sender: account.address.clone(),
            sequence,
            transaction: bound,
        };
        Ok((payload, operation))
    }

    async fn broadcast(&self, signed: &SignedOperation) -> Result<Operation, BroadcastError> {
        let tag = self.family.tag();
        if signed.family() != tag {
            return Err(BroadcastError::FamilyMismatch {
                operation: signed.family(),
                bridge: tag,
            });
        }
        if !signed.verify() {
            metrics::record_broadcast(tag.as_str(), "signature_mismatch");
            return Err(BroadcastError::SignatureMismatch);
        }

        let receipt = match self.api.submit(signed).await {
            Ok(receipt) => receipt,
            Err(source) => {
                metrics::record_broadcast(tag.as_str(), source.kind());
                tracing::warn!(family = %tag, error = %source, "Broadcast failed");
                return Err(BroadcastError::Network { source });
            }
        };
        if receipt.hash.is_empty() {
            metrics::record_broadcast(tag.as_str(), "missing_hash");
            return Err(BroadcastError::MissingHash);
        }

        let mut operation = patch_operation_with_hash(&signed.operation, &receipt.hash);
        match self.api.get_confirmation(&receipt.hash).await {
            Ok(Some(confirmation)) => {
                operation.block_height = Some(confirmation.block_height);
                operation.block_hash = Some(confirmation.block_hash);
            }
            Ok(None) => {}
            // The transaction is already accepted; confirmation is left to the next sync.
            Err(err) => tracing::debug!(hash = %receipt.hash, error = %err, "Confirmation lookup failed"),
        }

        metrics::record_broadcast(tag.as_str(), "success");
        tracing::info!(
            family = %tag,
            hash = %operation.hash,
            sequence = ?operation.transaction_sequence_number,
            confirmed = operation.is_confirmed(),
            "Transaction broadcast"
        );
        Ok(operation)
    }

    fn format_account_specifics(&self, account: &Account) -> String {
        self.family.format_account_specifics(account)
    }
}

impl<F: FamilySpec> std::fmt::Debug for ChainBridge<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainBridge")
            .field("family", &self.family.tag())
            .field("scan", &self.scan)
            .finish()
    }
}
