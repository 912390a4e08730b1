//! Account synchronization.
//!
//! # Data Flow
//! ```text
//! AccountShapeResolver  balance → sequence → height → history (since cursor)
//!        │
//!        ▼
//! merge_operations      prior ops + fresh ops, deduplicated by id
//!        │
//!        ▼
//! reconcile_pending     drop pending ops that are confirmed or superseded
//!        │
//!        ▼
//! SyncCoordinator       one sync per account at a time, atomic snapshot swap
//! ```

pub mod coordinator;
pub mod error;
pub mod merger;
pub mod pending;
pub mod resolver;

pub use coordinator::{AccountHandle, SyncCoordinator};
pub use error::{SyncError, SyncResult};
pub use merger::merge_operations;
pub use pending::{add_pending_operation, next_sequence, reconcile_pending};
pub use resolver::{AccountShape, AccountShapeResolver};
