//! Bridge errors.
//!
//! [`ValidationError`] values are collected into a transaction status rather
//! than thrown; the other types abort the call that produced them.

use thiserror::Error;

use crate::account::{Amount, FamilyTag};
use crate::network::NetworkError;

/// A reason a draft transaction cannot be signed as is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipient is required")]
    RecipientRequired,

    #[error("Invalid recipient address '{0}'")]
    InvalidAddress(String),

    #[error("Recipient is the sending account")]
    SameRecipient,

    #[error("Amount {amount} is out of range")]
    AmountOutOfRange { amount: Amount },

    #[error("Insufficient funds: {needed} needed, {available} spendable")]
    InsufficientFunds { needed: Amount, available: Amount },
}

/// Errors raised while submitting a signed operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Broadcast failed: {source}")]
    Network {
        #[source]
        source: NetworkError,
    },

    /// The signed operation no longer matches the payload that was signed.
    #[error("Signature does not match the signed payload")]
    SignatureMismatch,

    /// The chain accepted the payload without reporting a hash.
    #[error("Broadcast returned no transaction hash")]
    MissingHash,

    #[error("Signed operation of family {operation} sent to bridge {bridge}")]
    FamilyMismatch { operation: FamilyTag, bridge: FamilyTag },
}

/// Errors surfaced by transaction building calls on an [`crate::bridge::AccountBridge`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("{call} failed: {source}")]
    Network {
        call: &'static str,
        #[source]
        source: NetworkError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    /// The transaction has not been through `prepare_transaction`.
    #[error("Transaction is not prepared")]
    NotPrepared,

    #[error("Transaction of family {transaction} handed to bridge {bridge}")]
    FamilyMismatch { transaction: FamilyTag, bridge: FamilyTag },

    #[error("Family {0} is not registered")]
    UnsupportedFamily(FamilyTag),
}

impl BridgeError {
    /// Annotate a network failure with the call that produced it.
    pub fn network(call: &'static str) -> impl FnOnce(NetworkError) -> BridgeError {
        move |source| BridgeError::Network { call, source }
    }
}

/// Result type for bridge calls.
pub type BridgeResult<T> = Result<T, BridgeError>;
