//! Account bridges.
//!
//! Every family exposes the same capability set through [`AccountBridge`].
//! Callers never branch on the family: they look the bridge up in the
//! [`FamilyRegistry`] and call it.
//!
//! # Capability set
//! ```text
//! scan_accounts            derive, resolve, halt at first empty address
//! sync                     prior snapshot → new snapshot
//! create/update_transaction
//! prepare_transaction      fees from network config, idempotent
//! get_transaction_status   validation without network access
//! build_unsigned           payload for the external signer
//! broadcast                submit once, attach hash
//! format_account_specifics
//! ```
//!
//! Signing happens outside the core (see [`crate::lifecycle::TransactionSigner`]).

pub mod chain_bridge;
pub mod error;
pub mod family;
pub mod registry;
pub mod transaction;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::sync::Arc;

use crate::account::{Account, FamilyTag, Operation};
use crate::sync::SyncResult;

pub use chain_bridge::ChainBridge;
pub use error::{BridgeError, BridgeResult, BroadcastError, ValidationError};
pub use family::FamilySpec;
pub use registry::{FamilyRegistry, RegistryError};
pub use transaction::{
    FeeBasis, FeeQuote, SignedOperation, Transaction, TransactionMode, TransactionPatch,
    TransactionStatus, UnsignedPayload,
};

/// External address derivation (hardware wallet or key store).
#[async_trait]
pub trait AddressDeriver: Send + Sync {
    /// Address at `index` of the family's derivation scheme.
    async fn derive_address(&self, family: FamilyTag, index: u32) -> Result<String, String>;
}

/// Parameters of one discovery run.
#[derive(Clone)]
pub struct DerivationContext {
    pub deriver: Arc<dyn AddressDeriver>,
    /// Keep probing past the first empty address, up to the configured gap limit.
    pub deep: bool,
}

impl DerivationContext {
    pub fn new(deriver: Arc<dyn AddressDeriver>) -> Self {
        Self { deriver, deep: false }
    }

    pub fn deep(mut self) -> Self {
        self.deep = true;
        self
    }
}

impl std::fmt::Debug for DerivationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationContext").field("deep", &self.deep).finish()
    }
}

/// Uniform per-family account and transaction operations.
#[async_trait]
pub trait AccountBridge: Send + Sync {
    fn family(&self) -> FamilyTag;

    /// Lazily discover accounts. Each call starts a fresh run from index 0.
    ///
    /// The stream ends after the first empty account (included), after the
    /// gap limit of consecutive empty accounts when probing deep, at the
    /// index cap, or after the first error.
    fn scan_accounts<'a>(&'a self, context: DerivationContext) -> BoxStream<'a, SyncResult<Account>>;

    /// Produce a new snapshot from `account`. On error `account` stays authoritative.
    async fn sync(&self, account: &Account) -> SyncResult<Account>;

    fn create_transaction(&self) -> Transaction;

    fn update_transaction(&self, transaction: &Transaction, patch: TransactionPatch) -> Transaction;

    /// Fill in fees. Returns an equal value when fee inputs are unchanged.
    async fn prepare_transaction(&self, account: &Account, transaction: &Transaction) -> BridgeResult<Transaction>;

    fn get_transaction_status(&self, account: &Account, transaction: &Transaction) -> TransactionStatus;

    /// Bind a prepared transaction to the next safe sequence number.
    ///
    /// Returns the payload to sign and the optimistic operation it will produce.
    fn build_unsigned(&self, account: &Account, transaction: &Transaction) -> BridgeResult<(UnsignedPayload, Operation)>;

    /// Submit once. The returned operation carries the chain hash.
    async fn broadcast(&self, signed: &SignedOperation) -> Result<Operation, BroadcastError>;

    fn format_account_specifics(&self, account: &Account) -> String;
}
