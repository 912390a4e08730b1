//! External signing seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::account::Account;
use crate::bridge::transaction::UnsignedPayload;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The user or device declined to sign.
    #[error("Signing rejected: {0}")]
    Rejected(String),

    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}

/// Hardware wallet or key store that signs payloads on behalf of the core.
///
/// The core never holds key material.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    /// Sign `payload` for `account`.
    ///
    /// Returns the hex signature, or the hex raw signed transaction for
    /// families that submit one (Ethereum).
    async fn sign(&self, account: &Account, payload: &UnsignedPayload) -> Result<String, SignerError>;
}
