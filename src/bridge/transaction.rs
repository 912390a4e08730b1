//! Transaction drafts and signed payloads.
//!
//! # Flow
//! ```text
//! create_transaction        → Transaction (no fees)
//! update_transaction(patch) → Transaction (fresh value, input untouched)
//! prepare_transaction       → Transaction with fees and a FeeQuote
//! build_unsigned            → UnsignedPayload + optimistic Operation
//! external signer           → signature
//! SignedOperation::bind     → digest over payload and operation
//! broadcast                 → verify digest, submit once
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::{Amount, FamilyTag, Operation};
use crate::bridge::error::ValidationError;

/// Kind of transaction being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionMode {
    /// Plain native-currency transfer.
    #[default]
    Send,
}

/// The inputs a fee estimate depends on.
///
/// A prepared transaction whose basis is unchanged is not re-estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBasis {
    pub recipient: String,
    pub mode: TransactionMode,
    pub data_len: usize,
}

impl FeeBasis {
    pub fn of(transaction: &Transaction) -> Self {
        Self {
            recipient: transaction.recipient.clone(),
            mode: transaction.mode,
            data_len: transaction.data.as_ref().map_or(0, String::len),
        }
    }
}

/// Network parameters captured when fees were estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeQuote {
    pub chain_id: String,
    #[serde(with = "crate::account::amount::decimal")]
    pub gas_price: Amount,
    pub gas_limit: u64,
    pub basis: FeeBasis,
}

/// A transaction draft. Values are replaced, never mutated, by bridge calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub family: FamilyTag,
    pub mode: TransactionMode,
    #[serde(with = "crate::account::amount::decimal")]
    pub amount: Amount,
    pub recipient: String,
    /// Unset until prepared.
    #[serde(with = "crate::account::amount::decimal_opt")]
    pub fees: Option<Amount>,
    /// Send the whole spendable balance minus fees; `amount` is derived.
    pub use_all_amount: bool,
    /// Optional payload attached to the transfer.
    pub data: Option<String>,
    /// Set by `prepare_transaction`.
    pub fee_quote: Option<FeeQuote>,
}

impl Transaction {
    /// Empty draft for `family`.
    pub fn new(family: FamilyTag) -> Self {
        Self {
            family,
            mode: TransactionMode::Send,
            amount: Amount::ZERO,
            recipient: String::new(),
            fees: None,
            use_all_amount: false,
            data: None,
            fee_quote: None,
        }
    }

    /// True when `prepare_transaction` has estimated fees for the current inputs.
    pub fn is_prepared(&self) -> bool {
        match (&self.fees, &self.fee_quote) {
            (Some(_), Some(quote)) => quote.basis == FeeBasis::of(self),
            _ => false,
        }
    }
}

/// Field updates for [`Transaction`]. Unset fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionPatch {
    pub amount: Option<Amount>,
    pub recipient: Option<String>,
    pub use_all_amount: Option<bool>,
    pub mode: Option<TransactionMode>,
    /// `Some(None)` clears the data field.
    pub data: Option<Option<String>>,
    /// Overrides the estimated fees.
    pub fees: Option<Amount>,
}

impl TransactionPatch {
    pub fn apply(self, transaction: &Transaction) -> Transaction {
        let mut next = transaction.clone();
        if let Some(amount) = self.amount {
            next.amount = amount;
        }
        if let Some(recipient) = self.recipient {
            next.recipient = recipient;
        }
        if let Some(use_all_amount) = self.use_all_amount {
            next.use_all_amount = use_all_amount;
        }
        if let Some(mode) = self.mode {
            next.mode = mode;
        }
        if let Some(data) = self.data {
            next.data = data;
        }
        if let Some(fees) = self.fees {
            next.fees = Some(fees);
        }
        next
    }
}

/// Validation outcome for a draft, consumed by the caller before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    /// Blocking problems. Empty means the draft may be signed.
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
    pub estimated_fees: Amount,
    /// Amount sent to the recipient (derived when `use_all_amount`).
    pub amount: Amount,
    pub total_spent: Amount,
}

impl TransactionStatus {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What the external signer signs: the prepared transaction bound to a sender
/// and sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedPayload {
    pub sender: String,
    pub sequence: u64,
    pub transaction: Transaction,
}

/// An optimistic operation bound to its signed payload.
///
/// `payload_digest` covers the payload and the balance-relevant fields of
/// the operation. Broadcast refuses a value whose digest no longer matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOperation {
    pub operation: Operation,
    pub payload: UnsignedPayload,
    /// Hex signature, or the raw signed transaction for families that submit one.
    pub signature: String,
    pub payload_digest: String,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl SignedOperation {
    pub fn bind(operation: Operation, payload: UnsignedPayload, signature: String) -> Self {
        let payload_digest = payload_digest(&payload, &operation);
        Self {
            operation,
            payload,
            signature,
            payload_digest,
            expiration_date: None,
        }
    }

    pub fn with_expiration(mut self, expiration_date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(expiration_date);
        self
    }

    pub fn family(&self) -> FamilyTag {
        self.payload.transaction.family
    }

    /// True when neither the payload nor the operation changed since signing.
    pub fn verify(&self) -> bool {
        !self.signature.is_empty() && payload_digest(&self.payload, &self.operation) == self.payload_digest
    }
}

#[derive(Serialize)]
struct DigestInput<'a> {
    payload: &'a UnsignedPayload,
    value: String,
    fee: String,
    senders: &'a [String],
    recipients: &'a [String],
    sequence: Option<u64>,
}

/// Hex SHA-256 over the canonical JSON of the payload and operation.
pub fn payload_digest(payload: &UnsignedPayload, operation: &Operation) -> String {
    let input = DigestInput {
        payload,
        value: operation.value.to_string(),
        fee: operation.fee.to_string(),
        senders: &operation.senders,
        recipients: &operation.recipients,
        sequence: operation.transaction_sequence_number,
    };
    // Only strings, integers and plain structs: serialization cannot fail.
    let bytes = serde_json::to_vec(&input).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::OperationType;

    fn payload() -> UnsignedPayload {
        let mut transaction = Transaction::new(FamilyTag::Elrond);
        transaction.recipient = "erd1recipient".to_string();
        transaction.amount = Amount::from(1_000u64);
        transaction.fees = Some(Amount::from(50u64));
        UnsignedPayload {
            sender: "erd1sender".to_string(),
            sequence: 4,
            transaction,
        }
    }

    fn operation() -> Operation {
        Operation {
            id: "acc--OUT".to_string(),
            hash: String::new(),
            account_id: "acc".to_string(),
            op_type: OperationType::Out,
            value: Amount::from(1_050u64),
            fee: Amount::from(50u64),
            senders: vec!["erd1sender".to_string()],
            recipients: vec!["erd1recipient".to_string()],
            date: Utc::now(),
            block_height: None,
            block_hash: None,
            transaction_sequence_number: Some(4),
            has_failed: false,
        }
    }

    #[test]
    fn test_patch_leaves_input_untouched() {
        let draft = Transaction::new(FamilyTag::Ethereum);
        let next = TransactionPatch {
            recipient: Some("0xabc".to_string()),
            data: Some(Some("hi".to_string())),
            ..Default::default()
        }
        .apply(&draft);

        assert!(draft.recipient.is_empty());
        assert_eq!(next.recipient, "0xabc");
        assert_eq!(next.data.as_deref(), Some("hi"));

        let cleared = TransactionPatch {
            data: Some(None),
            ..Default::default()
        }
        .apply(&next);
        assert!(cleared.data.is_none());
    }

    #[test]
    fn test_is_prepared_tracks_basis() {
        let mut tx = payload().transaction;
        assert!(!tx.is_prepared());

        tx.fee_quote = Some(FeeQuote {
            chain_id: "1".to_string(),
            gas_price: Amount::from(1u64),
            gas_limit: 50,
            basis: FeeBasis::of(&tx),
        });
        assert!(tx.is_prepared());

        tx.recipient = "erd1other".to_string();
        assert!(!tx.is_prepared());
    }

    #[test]
    fn test_signed_operation_detects_tampering() {
        let signed = SignedOperation::bind(operation(), payload(), "sig".to_string());
        assert!(signed.verify());
        assert_eq!(signed.payload_digest.len(), 64);

        let mut tampered = signed.clone();
        tampered.payload.transaction.recipient = "erd1attacker".to_string();
        assert!(!tampered.verify());

        let mut tampered = signed.clone();
        tampered.operation.value = Amount::from(1u64);
        assert!(!tampered.verify());

        let mut unsigned = signed;
        unsigned.signature.clear();
        assert!(!unsigned.verify());
    }

    #[test]
    fn test_transaction_json_uses_decimal_amounts() {
        let json = serde_json::to_value(payload().transaction).unwrap();
        assert_eq!(json["amount"], "1000");
        assert_eq!(json["fees"], "50");
        assert_eq!(json["family"], "elrond");
        assert_eq!(json["useAllAmount"], false);
    }
}
