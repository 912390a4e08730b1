//! Network error classification.
//!
//! # Classification
//! ```text
//! no response (connect failure, reset, deadline)  → Down
//! HTTP 4xx                                        → ClientError (permanent)
//! HTTP 5xx                                        → ServerError (transient)
//! any other non-success status (1xx, 3xx, ...)    → InvalidResponse
//! 2xx with a body that cannot be decoded          → InvalidResponse
//! request that cannot be built (bad URL, body)    → InvalidRequest
//! ```
//!
//! # ClientError / ServerError message
//! The message is taken from the response body through one ordered chain,
//! first hit wins:
//! 1. Body must parse as JSON; a top-level array is replaced by its first item.
//! 2. The first field among `cause`, `error_message`, `error`, `message`,
//!    `msg` holding a truthy value is selected (null, `""`, `false` and `0`
//!    are skipped).
//! 3. A selected object yields its own `message` field.
//! 4. A selected string wrapped as `JsDefined(<json>)`, or itself holding JSON,
//!    is unwrapped to the inner `message` (or `message.message`).
//! 5. Otherwise the selected string is used verbatim.
//!
//! When the chain yields nothing the message is `API HTTP <status>`.

use serde_json::Value;
use thiserror::Error;

/// Fields probed, in order, for a server-provided error message.
const MESSAGE_FIELDS: [&str; 5] = ["cause", "error_message", "error", "message", "msg"];

/// Errors surfaced by [`crate::network::NetworkClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// No response was received.
    #[error("Network down: no response from {url}")]
    Down { url: String },

    /// The server answered with a 5xx status.
    #[error("Server error {status} from {url}: {message}")]
    ServerError {
        status: u16,
        message: String,
        url: String,
    },

    /// The server rejected the request with a 4xx status.
    #[error("Client error {status} from {url}: {message}")]
    ClientError {
        status: u16,
        message: String,
        url: String,
    },

    /// A success response whose body could not be decoded.
    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl NetworkError {
    /// Build the error for a non-success HTTP status.
    pub fn from_status(status: u16, body: &str, url: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| format!("API HTTP {}", status));
        let url = url.to_string();
        match status {
            400..=499 => NetworkError::ClientError { status, message, url },
            500..=599 => NetworkError::ServerError { status, message, url },
            _ => NetworkError::InvalidResponse {
                url,
                reason: format!("unexpected HTTP status {}: {}", status, message),
            },
        }
    }

    /// True for failures worth retrying later (Down, ServerError).
    pub fn is_transient(&self) -> bool {
        matches!(self, NetworkError::Down { .. } | NetworkError::ServerError { .. })
    }

    /// Short label used for log and metric outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkError::Down { .. } => "down",
            NetworkError::ServerError { .. } => "server_error",
            NetworkError::ClientError { .. } => "client_error",
            NetworkError::InvalidResponse { .. } => "invalid_response",
            NetworkError::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Run the ordered message chain over a raw response body.
pub fn extract_error_message(body: &str) -> Option<String> {
    let mut data: Value = serde_json::from_str(body).ok()?;
    if let Value::Array(items) = data {
        data = items.into_iter().next()?;
    }

    let selected = MESSAGE_FIELDS
        .iter()
        .find_map(|field| data.get(*field).filter(|v| is_truthy(v)))?;

    match selected {
        Value::Object(_) => selected
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::String(s) => Some(unwrap_embedded_message(s).unwrap_or_else(|| s.clone())),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn unwrap_embedded_message(raw: &str) -> Option<String> {
    let inner = raw
        .strip_prefix("JsDefined(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(raw);

    let parsed: Value = serde_json::from_str(inner).ok()?;
    match parsed.get("message")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => parsed["message"]
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order() {
        let body = r#"{"message":"second","cause":"first"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("first"));

        let body = r#"{"msg":"last resort"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("last resort"));
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let body = r#"{"cause":"","error_message":null,"error":false,"message":"nonce too low"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("nonce too low"));

        let body = r#"{"cause":"","msg":0}"#;
        assert!(extract_error_message(body).is_none());
    }

    #[test]
    fn test_array_uses_first_item() {
        let body = r#"[{"error":"bad nonce"},{"error":"ignored"}]"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("bad nonce"));
    }

    #[test]
    fn test_js_defined_wrapper() {
        let body = r#"{"error":"JsDefined({\"message\":\"insufficient funds\"})"}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("insufficient funds"));

        let nested = r#"{"error":"JsDefined({\"message\":{\"message\":\"deep\"}})"}"#;
        assert_eq!(extract_error_message(nested).as_deref(), Some("deep"));
    }

    #[test]
    fn test_object_field_message() {
        let body = r#"{"error":{"code":"tx_failed","message":"lower nonce in transaction"}}"#;
        assert_eq!(
            extract_error_message(body).as_deref(),
            Some("lower nonce in transaction")
        );
    }

    #[test]
    fn test_non_json_yields_none() {
        assert!(extract_error_message("<html>Bad Gateway</html>").is_none());
        assert!(extract_error_message(r#"{"status":"fail"}"#).is_none());
    }

    #[test]
    fn test_status_classification() {
        let err = NetworkError::from_status(404, r#"{"message":"account not found"}"#, "http://api/x");
        assert_eq!(
            err,
            NetworkError::ClientError {
                status: 404,
                message: "account not found".to_string(),
                url: "http://api/x".to_string(),
            }
        );
        assert!(!err.is_transient());

        let err = NetworkError::from_status(503, "", "http://api/x");
        match &err {
            NetworkError::ServerError { message, .. } => assert_eq!(message, "API HTTP 503"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.is_transient());
    }

    #[test]
    fn test_unexpected_status_not_transient() {
        for status in [101, 302, 304, 600] {
            let err = NetworkError::from_status(status, "", "http://api/x");
            assert!(
                matches!(err, NetworkError::InvalidResponse { .. }),
                "{} classified as {:?}",
                status,
                err
            );
            assert!(!err.is_transient());
        }
    }
}
