//! Multi-chain account synchronization core.
//!
//! Discovers accounts, keeps their balances and operation histories in sync
//! with each chain, and drives transactions from draft to confirmation.
//! Signing and address derivation are delegated to external collaborators.

pub mod account;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod families;
pub mod lifecycle;
pub mod network;
pub mod observability;
pub mod resilience;
pub mod sync;

pub use account::{Account, Amount, FamilyTag, Operation, OperationType};
pub use bridge::{AccountBridge, AddressDeriver, DerivationContext, FamilyRegistry, Transaction};
pub use config::SyncConfig;
pub use lifecycle::{TransactionFlow, TransactionSigner};
pub use network::{NetworkClient, NetworkError};
pub use sync::{AccountHandle, SyncCoordinator, SyncError};
