//! Retry decisions for outbound chain API calls.
//!
//! # Responsibilities
//! - Decide whether a method may be retried at all (idempotent reads only)
//! - Decide whether a failure is transient
//! - Bound the number of attempts per call
//!
//! # Design Decisions
//! - Never retry POST/PUT/DELETE/PATCH: a submitted transaction must not be
//!   sent twice because the first response was lost
//! - Down and 5xx are transient; 4xx and undecodable bodies are not

use reqwest::Method;

use crate::config::RetryConfig;
use crate::network::NetworkError;

/// Returns true if a request with this method can be replayed safely.
pub fn is_idempotent(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Returns true if `error` should trigger another attempt of `method`.
pub fn is_retryable(method: &Method, error: &NetworkError) -> bool {
    is_idempotent(method) && error.is_transient()
}

/// Number of attempts allowed for `method` under `config`.
///
/// Non-idempotent calls always execute once.
pub fn max_attempts_for(method: &Method, config: &RetryConfig) -> u32 {
    if is_idempotent(method) {
        config.max_attempts.max(1)
    } else {
        1
    }
}
