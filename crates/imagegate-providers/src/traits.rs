//! Provider-side abstractions.
//!
//! - [`TokenSource`] yields short-lived bearer tokens for the outbound call.
//! - [`ImageGenerator`] is what the HTTP front end calls; `ImageGateway` is the
//!   real implementation.

use async_trait::async_trait;
use imagegate_core::{GatewayError, GenerationRequest, GenerationResult};

/// A capability that produces a bearer token on demand.
///
/// Called once per generation. Tokens are never cached here, so implementations
/// must be safe to call concurrently.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a fresh token. Failures surface as [`GatewayError::Auth`].
    async fn token(&self) -> Result<String, GatewayError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

/// Something that turns a validated request into a normalized result.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Run one generation.
    ///
    /// Never returns an error: every failure is a `GenerationResult::Failure`.
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}
