//! Synchronization errors.

use thiserror::Error;

use crate::account::FamilyTag;
use crate::network::NetworkError;

/// Errors that abort a sync or scan. The prior account stays authoritative.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed mid-resolution; partial progress was discarded.
    #[error("{call} failed: {source}")]
    Network {
        call: &'static str,
        #[source]
        source: NetworkError,
    },

    /// The external deriver could not produce an address.
    #[error("Address derivation failed at index {index}: {reason}")]
    Derivation { index: u32, reason: String },

    /// The account was handed to the bridge of another family.
    #[error("Account family {account} does not match bridge family {bridge}")]
    FamilyMismatch { account: FamilyTag, bridge: FamilyTag },

    /// No bridge registered for the family.
    #[error("Family {0} is not registered")]
    UnsupportedFamily(FamilyTag),
}

impl SyncError {
    /// Annotate a network failure with the call that produced it.
    pub fn network(call: &'static str) -> impl FnOnce(NetworkError) -> SyncError {
        move |source| SyncError::Network { call, source }
    }

    /// True when retrying the same sync later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network { source, .. } => source.is_transient(),
            _ => false,
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
