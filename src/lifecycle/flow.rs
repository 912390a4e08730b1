//! Transaction flow state machine.

use std::sync::Arc;
use thiserror::Error;

use crate::account::{Account, Operation};
use crate::bridge::error::{BridgeError, BroadcastError};
use crate::bridge::transaction::{SignedOperation, Transaction, TransactionPatch};
use crate::bridge::AccountBridge;
use crate::lifecycle::signer::{SignerError, TransactionSigner};
use crate::sync::AccountHandle;

/// Where a transaction stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    Draft(Transaction),
    Prepared(Transaction),
    Signed(SignedOperation),
    /// Submitted with a hash, not yet observed in a block.
    Broadcast(Operation),
    Confirmed(Operation),
    Failed(Operation),
}

impl TransactionState {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionState::Draft(_) => "draft",
            TransactionState::Prepared(_) => "prepared",
            TransactionState::Signed(_) => "signed",
            TransactionState::Broadcast(_) => "broadcast",
            TransactionState::Confirmed(_) => "confirmed",
            TransactionState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionState::Confirmed(_) | TransactionState::Failed(_))
    }

    /// Settled state for a broadcast operation.
    fn after_broadcast(operation: Operation) -> Self {
        if operation.has_failed {
            TransactionState::Failed(operation)
        } else if operation.is_confirmed() {
            TransactionState::Confirmed(operation)
        } else {
            TransactionState::Broadcast(operation)
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Cannot {action} a transaction in state {state}")]
    InvalidState { action: &'static str, state: &'static str },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

fn invalid(action: &'static str, state: &TransactionState) -> LifecycleError {
    LifecycleError::InvalidState {
        action,
        state: state.name(),
    }
}

/// Drives one transaction from draft to a settled state through a bridge.
pub struct TransactionFlow {
    bridge: Arc<dyn AccountBridge>,
    state: TransactionState,
}

impl TransactionFlow {
    /// Start from the bridge's empty draft.
    pub fn new(bridge: Arc<dyn AccountBridge>) -> Self {
        let draft = bridge.create_transaction();
        Self {
            bridge,
            state: TransactionState::Draft(draft),
        }
    }

    pub fn state(&self) -> &TransactionState {
        &self.state
    }

    /// Current draft, whatever the state before broadcast.
    pub fn transaction(&self) -> Option<&Transaction> {
        match &self.state {
            TransactionState::Draft(tx) | TransactionState::Prepared(tx) => Some(tx),
            TransactionState::Signed(signed) => Some(&signed.payload.transaction),
            _ => None,
        }
    }

    /// Apply `patch`. Any prior preparation or signature is discarded.
    pub fn update(&mut self, patch: TransactionPatch) -> Result<(), LifecycleError> {
        let next = match self.transaction() {
            Some(tx) => self.bridge.update_transaction(tx, patch),
            None => return Err(invalid("update", &self.state)),
        };
        self.state = TransactionState::Draft(next);
        Ok(())
    }

    pub async fn prepare(&mut self, account: &Account) -> Result<&Transaction, LifecycleError> {
        let tx = match &self.state {
            TransactionState::Draft(tx) | TransactionState::Prepared(tx) => tx,
            other => return Err(invalid("prepare", other)),
        };
        let prepared = self.bridge.prepare_transaction(account, tx).await?;
        self.state = TransactionState::Prepared(prepared);

        match &self.state {
            TransactionState::Prepared(tx) => Ok(tx),
            other => Err(invalid("prepare", other)),
        }
    }

    /// Bind the prepared transaction to the next sequence number and have it signed.
    pub async fn sign(
        &mut self,
        account: &Account,
        signer: &dyn TransactionSigner,
    ) -> Result<&SignedOperation, LifecycleError> {
        let tx = match &self.state {
            TransactionState::Prepared(tx) => tx,
            other => return Err(invalid("sign", other)),
        };
        let (payload, operation) = self.bridge.build_unsigned(account, tx)?;
        let signature = signer.sign(account, &payload).await?;
        self.state = TransactionState::Signed(SignedOperation::bind(operation, payload, signature));

        match &self.state {
            TransactionState::Signed(signed) => Ok(signed),
            other => Err(invalid("sign", other)),
        }
    }

    /// Submit once and record the operation as pending on `handle`.
    pub async fn broadcast(&mut self, handle: &AccountHandle) -> Result<Operation, LifecycleError> {
        let signed = match &self.state {
            TransactionState::Signed(signed) => signed,
            other => return Err(invalid("broadcast", other)),
        };
        let operation = self.bridge.broadcast(signed).await?;
        handle.record_pending(operation.clone())?;

        self.state = TransactionState::after_broadcast(operation.clone());
        Ok(operation)
    }

    /// Settle a broadcast transaction against a freshly synced account.
    ///
    /// Confirmed or failed when the synced history holds the operation;
    /// failed when it left the pending list without appearing in history
    /// (its sequence number was consumed by another transaction).
    pub fn reconcile(&mut self, synced: &Account) -> &TransactionState {
        if let TransactionState::Broadcast(op) = &self.state {
            let observed = synced.operations.iter().find(|o| o.id == op.id);
            let still_pending = synced.pending_operations.iter().any(|p| p.id == op.id);

            let next = match observed {
                Some(found) if found.has_failed || found.is_confirmed() => {
                    Some(TransactionState::after_broadcast(found.clone()))
                }
                Some(_) => None,
                None if still_pending => None,
                None => Some(TransactionState::Failed(Operation {
                    has_failed: true,
                    ..op.clone()
                })),
            };

            if let Some(next) = next {
                tracing::info!(hash = %op.hash, state = next.name(), "Transaction settled");
                self.state = next;
            }
        }
        &self.state
    }
}

impl std::fmt::Debug for TransactionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionFlow")
            .field("family", &self.bridge.family())
            .field("state", &self.state.name())
            .finish()
    }
}
