//! Ethereum family rules.

use alloy::primitives::Address;
use std::str::FromStr;

use crate::account::{Account, FamilyResources, FamilyTag};
use crate::bridge::family::FamilySpec;
use crate::bridge::transaction::Transaction;
use crate::chain::NetworkConfig;

/// Gas of a plain value transfer.
pub const BASE_GAS_LIMIT: u64 = 21_000;

/// Calldata cost per byte (non-zero byte price, simplified).
pub const GAS_PER_DATA_BYTE: u64 = 16;

/// EIP-55 checksummed spelling of `address`, or the input when it does not parse.
pub fn normalize_address(address: &str) -> String {
    Address::from_str(address)
        .map(|a| a.to_checksum(None))
        .unwrap_or_else(|_| address.to_string())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EthereumFamily;

impl FamilySpec for EthereumFamily {
    fn tag(&self) -> FamilyTag {
        FamilyTag::Ethereum
    }

    fn is_valid_address(&self, address: &str) -> bool {
        address.starts_with("0x") && Address::from_str(address).is_ok()
    }

    fn normalize_address(&self, address: &str) -> String {
        normalize_address(address)
    }

    fn gas_limit(&self, config: &NetworkConfig, transaction: &Transaction) -> u64 {
        let data_len = transaction.data.as_ref().map_or(0, String::len) as u64;
        config
            .gas_limit
            .max(BASE_GAS_LIMIT)
            .saturating_add(GAS_PER_DATA_BYTE.saturating_mul(data_len))
    }

    fn format_account_specifics(&self, account: &Account) -> String {
        let nonce = match &account.resources {
            FamilyResources::Ethereum(resources) => resources.nonce,
            _ => account.remote_sequence(),
        };
        format!(" {} spendable.\nnonce : {}", account.spendable_balance, nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Amount;

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
        assert_eq!(normalize_address("garbage"), "garbage");
    }

    #[test]
    fn test_address_validation() {
        let family = EthereumFamily;
        assert!(family.is_valid_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!family.is_valid_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!family.is_valid_address("0x1234"));
        assert!(!family.is_valid_address(""));
    }

    #[test]
    fn test_fees() {
        let config = NetworkConfig {
            chain_id: "1".to_string(),
            gas_price: Amount::from(30_000_000_000u64),
            gas_limit: BASE_GAS_LIMIT,
            denomination: 18,
        };
        let mut tx = Transaction::new(FamilyTag::Ethereum);
        assert_eq!(
            EthereumFamily.estimate_fees(&config, &tx),
            Amount::from(21_000u64 * 30_000_000_000)
        );

        tx.data = Some("abcd".to_string());
        assert_eq!(EthereumFamily.gas_limit(&config, &tx), 21_064);
    }
}
