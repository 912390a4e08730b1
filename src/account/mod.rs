//! Account data model.
//!
//! # Lifecycle
//! ```text
//! scan_accounts  → first Account snapshot
//! sync(prev)     → new snapshot (prev is never mutated)
//! broadcast      → add_pending_operation → new snapshot
//! removal        → caller concern
//! ```

pub mod amount;
pub mod operation;
pub mod raw;
pub mod types;

pub use amount::parse_decimal;
pub use operation::{encode_account_id, encode_operation_id, patch_operation_with_hash};
pub use raw::{from_account_raw, to_account_raw, AccountRaw, OperationRaw, RawAccountError};
pub use types::{
    Account, Amount, ElrondResources, EthereumResources, FamilyResources, FamilyTag, Operation,
    OperationType,
};
