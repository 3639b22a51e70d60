//! Imagegate core — shared types, errors, and configuration.
//!
//! This crate contains:
//! - **types**: generation request/response values and the normalized result
//! - **error**: the gateway error taxonomy
//! - **config**: settings schema and the layered loader (file, `.env`, env vars)

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use error::{ErrorKind, GatewayError};
pub use types::{
    GenerationRequest, GenerationResult, ProtocolVariant, UpstreamBody, UpstreamResponse,
};
