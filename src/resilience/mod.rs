//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkClient::execute
//!     → timeouts.rs (request-scoped deadline, elapsed = Down)
//!     → On failure: retries.rs (idempotent? transient? attempts left?)
//!     → backoff.rs (capped exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Every outbound read has a deadline
//! - Retries only for idempotent requests (GET, HEAD)
//! - Attempt count is bounded by configuration; exceeding it surfaces the
//!   last classified error unchanged

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::BackoffPolicy;
