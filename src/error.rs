//! Error types for store operations.

use serde_json::Value;
use thiserror::Error;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The client was built from unusable settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP round trip failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request or response body could not be serialized or parsed.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The store answered with well-formed JSON of an unexpected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The store reported an error payload.
    #[error("Server error: {0}")]
    Server(String),

    /// Arguments failed validation before any request was issued.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extract a server-reported `error` payload from a response body.
///
/// The store usually reports `{"error": {"type": .., "reason": ..}}`; some
/// endpoints shorten this to a bare string.
pub(crate) fn server_error(body: &Value) -> Option<Error> {
    match body.get("error")? {
        Value::String(message) => Some(Error::Server(message.clone())),
        error => {
            let kind = error.get("type").and_then(Value::as_str).unwrap_or("unknown");
            let reason = error.get("reason").and_then(Value::as_str).unwrap_or("unknown");
            Some(Error::Server(format!("{kind}: {reason}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_server_error_object() {
        let body = json!({"error": {"type": "index_not_found_exception", "reason": "no such index"}});
        let err = server_error(&body).unwrap();
        assert_eq!(
            err.to_string(),
            "Server error: index_not_found_exception: no such index"
        );
    }

    #[test]
    fn test_server_error_string() {
        let body = json!({"error": "forbidden"});
        let err = server_error(&body).unwrap();
        assert_eq!(err.to_string(), "Server error: forbidden");
    }

    #[test]
    fn test_server_error_absent() {
        assert!(server_error(&json!({"acknowledged": true})).is_none());
    }
}
