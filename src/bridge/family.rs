//! Per-family hooks plugged into [`crate::bridge::ChainBridge`].

use crate::account::{Account, Amount, FamilyTag};
use crate::chain::NetworkConfig;
use crate::bridge::transaction::Transaction;

/// What differs between families once the chain API is abstracted away.
pub trait FamilySpec: Send + Sync + 'static {
    fn tag(&self) -> FamilyTag;

    fn is_valid_address(&self, address: &str) -> bool;

    /// Canonical spelling of an address, used for ids and sender matching.
    fn normalize_address(&self, address: &str) -> String {
        address.to_string()
    }

    /// Gas units consumed by `transaction` under `config`.
    fn gas_limit(&self, config: &NetworkConfig, transaction: &Transaction) -> u64;

    fn estimate_fees(&self, config: &NetworkConfig, transaction: &Transaction) -> Amount {
        Amount::from(self.gas_limit(config, transaction)).saturating_mul(config.gas_price)
    }

    /// Adjust a freshly synced account (spendable balance, resources).
    fn post_sync(&self, _initial: Option<&Account>, synced: Account) -> Account {
        synced
    }

    /// Short human-readable summary of family-specific state.
    fn format_account_specifics(&self, account: &Account) -> String;
}
