//! Network subsystem.
//!
//! # Data Flow
//! ```text
//! family api (elrond/api.rs, ethereum/api.rs)
//!     → client.rs (NetworkClient::execute)
//!         → resilience (deadline, retry, backoff)
//!         → reqwest
//!     ← body text or classified NetworkError (error.rs)
//! ```
//!
//! # Design Decisions
//! - One explicitly constructed client, injected into each family API
//! - Errors bubble unchanged; callers annotate them with the originating call

pub mod client;
pub mod error;

pub use client::{NetworkClient, NetworkRequest};
pub use error::{extract_error_message, NetworkError, NetworkResult};
