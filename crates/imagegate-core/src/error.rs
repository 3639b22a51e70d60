//! Gateway error taxonomy.
//!
//! `GatewayError` is what the request builder and the HTTP layer return.
//! `ErrorKind` is the flat, serializable tag carried by
//! [`GenerationResult::Failure`](crate::types::GenerationResult).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised before a usable upstream response exists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Provider configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Credential or token acquisition failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The outbound HTTP call did not complete.
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// The prompt was empty after trimming.
    #[error("Prompt is required")]
    EmptyPrompt,
}

impl GatewayError {
    /// The result tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Config(_) => ErrorKind::ConfigError,
            GatewayError::Auth(_) => ErrorKind::AuthError,
            GatewayError::Transport(_) => ErrorKind::TransportError,
            GatewayError::EmptyPrompt => ErrorKind::InvalidPrompt,
        }
    }
}

/// Failure categories reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigError,
    AuthError,
    TransportError,
    NoImageUrl,
    InvalidPrompt,
    /// A fault inside the core that was caught at the component boundary.
    InternalError,
}

impl ErrorKind {
    /// Whether failures of this kind carry the raw upstream body.
    pub fn is_diagnostic(self) -> bool {
        matches!(self, ErrorKind::NoImageUrl)
    }

    /// Whether the caller, not the gateway, is at fault.
    pub fn is_client_error(self) -> bool {
        matches!(self, ErrorKind::InvalidPrompt)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ConfigError => "config_error",
            ErrorKind::AuthError => "auth_error",
            ErrorKind::TransportError => "transport_error",
            ErrorKind::NoImageUrl => "no_image_url",
            ErrorKind::InvalidPrompt => "invalid_prompt",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(GatewayError::Config("x".into()).kind(), ErrorKind::ConfigError);
        assert_eq!(GatewayError::Auth("x".into()).kind(), ErrorKind::AuthError);
        assert_eq!(GatewayError::Transport("x".into()).kind(), ErrorKind::TransportError);
        assert_eq!(GatewayError::EmptyPrompt.kind(), ErrorKind::InvalidPrompt);
    }

    #[test]
    fn test_error_display_includes_cause() {
        let err = GatewayError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "upstream request failed: connection refused");
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_value(ErrorKind::NoImageUrl).unwrap();
        assert_eq!(json, "no_image_url");
        assert_eq!(ErrorKind::NoImageUrl.to_string(), "no_image_url");
    }

    #[test]
    fn test_only_no_image_url_is_diagnostic() {
        assert!(ErrorKind::NoImageUrl.is_diagnostic());
        assert!(!ErrorKind::TransportError.is_diagnostic());
        assert!(!ErrorKind::AuthError.is_diagnostic());
    }
}
