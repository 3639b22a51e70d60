//! Upstream side of Imagegate.
//!
//! # Architecture
//!
//! - [`traits`] — `TokenSource` and `ImageGenerator` seams
//! - [`auth`] — static keys, bearer token sources (Azure CLI, managed identity)
//! - [`registry`] — static specs for the two supported protocols
//! - [`request`] — builds the exact upstream request for a prompt
//! - [`normalize`] — finds the image URL in whatever came back
//! - [`http_provider::ImageGateway`] — one call: build, send, normalize

pub mod auth;
pub mod config;
pub mod http_provider;
pub mod normalize;
pub mod registry;
pub mod request;
pub mod traits;

// Re-export main types for convenience
pub use auth::{AuthStrategy, AzureCliTokenSource, ManagedIdentityTokenSource, StaticTokenSource};
pub use config::ProviderConfig;
pub use http_provider::{generate_guarded, ImageGateway};
pub use normalize::normalize;
pub use registry::{find_by_variant, ProtocolSpec, PROTOCOLS};
pub use request::{build_request, UpstreamRequest};
pub use traits::{ImageGenerator, TokenSource};
