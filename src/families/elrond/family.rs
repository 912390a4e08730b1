//! Elrond family rules.

use crate::account::{Account, FamilyResources, FamilyTag};
use crate::bridge::family::FamilySpec;
use crate::bridge::transaction::Transaction;
use crate::chain::NetworkConfig;

/// Human-readable part of every Elrond address.
pub const ADDRESS_PREFIX: &str = "erd1";

/// Length of a bech32 encoded 32-byte public key with the `erd` prefix.
pub const ADDRESS_LENGTH: usize = 62;

/// Extra gas charged per byte of transaction data.
pub const GAS_PER_DATA_BYTE: u64 = 1_500;

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Elrond (MultiversX) account rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElrondFamily;

impl FamilySpec for ElrondFamily {
    fn tag(&self) -> FamilyTag {
        FamilyTag::Elrond
    }

    fn is_valid_address(&self, address: &str) -> bool {
        address.len() == ADDRESS_LENGTH
            && address
                .strip_prefix(ADDRESS_PREFIX)
                .is_some_and(|data| data.chars().all(|c| BECH32_CHARSET.contains(c)))
    }

    fn gas_limit(&self, config: &NetworkConfig, transaction: &Transaction) -> u64 {
        let data_len = transaction.data.as_ref().map_or(0, String::len) as u64;
        config
            .gas_limit
            .saturating_add(GAS_PER_DATA_BYTE.saturating_mul(data_len))
    }

    fn format_account_specifics(&self, account: &Account) -> String {
        let mut out = format!(" {} spendable.", account.spendable_balance);
        if let FamilyResources::Elrond(resources) = &account.resources {
            if resources.nonce > 0 {
                out.push_str(&format!("\nnonce : {}", resources.nonce));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Amount;

    const VALID: &str = "erd1qyu5wthldzr8wx5c9ucg8kjagg0jfs53s8nr3zpz3hypefsdd8ssycr6th";

    fn config() -> NetworkConfig {
        NetworkConfig {
            chain_id: "1".to_string(),
            gas_price: Amount::from(1_000_000_000u64),
            gas_limit: 50_000,
            denomination: 18,
        }
    }

    #[test]
    fn test_address_validation() {
        let family = ElrondFamily;
        assert_eq!(VALID.len(), ADDRESS_LENGTH);
        assert!(family.is_valid_address(VALID));
        assert!(!family.is_valid_address(""));
        assert!(!family.is_valid_address(&VALID.replacen("erd1", "abc1", 1)));
        assert!(!family.is_valid_address(&VALID[..61]));
        // 'b' is outside the bech32 alphabet.
        assert!(!family.is_valid_address(&format!("{}b", &VALID[..61])));
    }

    #[test]
    fn test_fees_without_data() {
        let tx = Transaction::new(FamilyTag::Elrond);
        assert_eq!(
            ElrondFamily.estimate_fees(&config(), &tx),
            Amount::from(50_000u64 * 1_000_000_000)
        );
    }

    #[test]
    fn test_fees_with_data() {
        let mut tx = Transaction::new(FamilyTag::Elrond);
        tx.data = Some("hello".to_string());
        assert_eq!(ElrondFamily.gas_limit(&config(), &tx), 57_500);
        assert_eq!(
            ElrondFamily.estimate_fees(&config(), &tx),
            Amount::from(57_500u64 * 1_000_000_000)
        );
    }
}
