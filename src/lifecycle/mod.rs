//! Transaction lifecycle.
//!
//! # States
//! ```text
//! Draft ──prepare──► Prepared ──sign──► Signed ──broadcast──► Broadcast
//!   ▲                   │                 │                    │
//!   └──────update───────┴─────────────────┘           reconcile (next sync)
//!                                                              │
//!                                                   Confirmed ◄┴► Failed
//! ```
//!
//! - A failed prepare leaves the flow where it was
//! - A failed broadcast leaves the flow in Signed and records nothing
//! - Editing after preparation or signing returns to Draft

pub mod flow;
pub mod signer;

pub use flow::{LifecycleError, TransactionFlow, TransactionState};
pub use signer::{SignerError, TransactionSigner};
