//! In-memory [`ChainApiClient`] for tests and dry runs.
//!
//! Holds balances, nonces and history in process. Calls are logged by name,
//! and any call can be made to fail until cleared.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::account::Amount;
use crate::bridge::transaction::SignedOperation;
use crate::chain::{
    ChainApiClient, Confirmation, NetworkConfig, RawTransaction, RawTransactionStatus, SubmitReceipt,
};
use crate::network::{NetworkError, NetworkResult};

#[derive(Debug, Default)]
struct ChainState {
    accounts: HashMap<String, (Amount, u64)>,
    block_height: u64,
    network_config: Option<NetworkConfig>,
    history: Vec<RawTransaction>,
    submitted: Vec<SignedOperation>,
    confirmed: HashMap<String, Confirmation>,
    failures: HashMap<&'static str, NetworkError>,
    confirm_inline: bool,
}

/// A programmable chain kept in memory.
#[derive(Debug, Default)]
pub struct MemoryChain {
    state: Mutex<ChainState>,
    calls: Mutex<Vec<&'static str>>,
}

impl MemoryChain {
    pub fn new(network_config: NetworkConfig) -> Self {
        let chain = Self::default();
        chain.state().network_config = Some(network_config);
        chain
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, call: &'static str) -> NetworkResult<()> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
        match self.state().failures.get(call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn set_account(&self, address: &str, balance: Amount, nonce: u64) {
        self.state().accounts.insert(address.to_string(), (balance, nonce));
    }

    pub fn set_block_height(&self, height: u64) {
        self.state().block_height = height;
    }

    pub fn push_transaction(&self, transaction: RawTransaction) {
        self.state().history.push(transaction);
    }

    /// Confirm a previously submitted hash, as the next sync will observe it.
    pub fn confirm(&self, hash: &str, block_height: u64) {
        let mut state = self.state();
        let confirmation = Confirmation {
            block_height,
            block_hash: format!("block{}", block_height),
        };
        for tx in state.history.iter_mut().filter(|tx| tx.hash == hash) {
            tx.block_height = Some(confirmation.block_height);
            tx.block_hash = Some(confirmation.block_hash.clone());
            tx.status = RawTransactionStatus::Success;
        }
        state.confirmed.insert(hash.to_string(), confirmation);
    }

    /// Report submitted transactions as confirmed right away.
    pub fn confirm_inline(&self, enabled: bool) {
        self.state().confirm_inline = enabled;
    }

    /// Make `call` fail with `error` until [`MemoryChain::clear_failures`].
    pub fn fail(&self, call: &'static str, error: NetworkError) {
        self.state().failures.insert(call, error);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Names of the calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn submitted(&self) -> Vec<SignedOperation> {
        self.state().submitted.clone()
    }
}

#[async_trait]
impl ChainApiClient for MemoryChain {
    async fn get_balance(&self, address: &str) -> NetworkResult<Amount> {
        self.enter("get_balance")?;
        Ok(self.state().accounts.get(address).map_or(Amount::ZERO, |(b, _)| *b))
    }

    async fn get_sequence(&self, address: &str) -> NetworkResult<u64> {
        self.enter("get_sequence")?;
        Ok(self.state().accounts.get(address).map_or(0, |(_, n)| *n))
    }

    async fn get_block_height(&self) -> NetworkResult<u64> {
        self.enter("get_block_height")?;
        Ok(self.state().block_height)
    }

    async fn get_network_config(&self) -> NetworkResult<NetworkConfig> {
        self.enter("get_network_config")?;
        self.state()
            .network_config
            .clone()
            .ok_or_else(|| NetworkError::InvalidResponse {
                url: "memory://network/config".to_string(),
                reason: "no network config".to_string(),
            })
    }

    async fn get_history(
        &self,
        address: &str,
        since: Option<DateTime<Utc>>,
    ) -> NetworkResult<Vec<RawTransaction>> {
        self.enter("get_history")?;
        let mut matching: Vec<RawTransaction> = self
            .state()
            .history
            .iter()
            .filter(|tx| tx.sender == address || tx.receiver.as_deref() == Some(address))
            .filter(|tx| since.map_or(true, |since| tx.timestamp >= since))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }

    async fn submit(&self, signed: &SignedOperation) -> NetworkResult<SubmitReceipt> {
        self.enter("submit")?;
        let mut state = self.state();
        state.submitted.push(signed.clone());
        let hash = format!("hash{}", state.submitted.len());
        if state.confirm_inline {
            let block_height = state.block_height + 1;
            state.confirmed.insert(
                hash.clone(),
                Confirmation {
                    block_height,
                    block_hash: format!("block{}", block_height),
                },
            );
        }
        Ok(SubmitReceipt { hash })
    }

    async fn get_confirmation(&self, hash: &str) -> NetworkResult<Option<Confirmation>> {
        self.enter("get_confirmation")?;
        Ok(self.state().confirmed.get(hash).cloned())
    }
}
