//! Chain API seam.
//!
//! Each family provides one [`ChainApiClient`] that translates to and from the
//! chain's native API. Clients are constructed explicitly and injected into
//! the resolver and bridge, so tests can substitute in-memory doubles.

pub mod memory;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::account::Amount;
use crate::bridge::transaction::SignedOperation;
use crate::network::NetworkResult;

pub use memory::MemoryChain;
pub use types::{Confirmation, NetworkConfig, RawTransaction, RawTransactionStatus, SubmitReceipt};

/// Per-family translation to the chain's remote API.
#[async_trait]
pub trait ChainApiClient: Send + Sync {
    /// Current balance of `address`. Unknown addresses report zero.
    async fn get_balance(&self, address: &str) -> NetworkResult<Amount>;

    /// Remote-reported next sequence number (nonce) of `address`.
    async fn get_sequence(&self, address: &str) -> NetworkResult<u64>;

    /// Current chain height.
    async fn get_block_height(&self) -> NetworkResult<u64>;

    async fn get_network_config(&self) -> NetworkResult<NetworkConfig>;

    /// Transactions involving `address`, optionally only those at or after `since`.
    async fn get_history(
        &self,
        address: &str,
        since: Option<DateTime<Utc>>,
    ) -> NetworkResult<Vec<RawTransaction>>;

    /// Submit a signed payload. Executed once, never retried.
    async fn submit(&self, signed: &SignedOperation) -> NetworkResult<SubmitReceipt>;

    /// Inclusion lookup for families that do not confirm inline.
    async fn get_confirmation(&self, _hash: &str) -> NetworkResult<Option<Confirmation>> {
        Ok(None)
    }
}
