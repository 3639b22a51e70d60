//! Core value types for a single generation call.
//!
//! A call flows `GenerationRequest` → upstream HTTP → `UpstreamResponse` →
//! `GenerationResult`. Nothing here outlives the call except `ProtocolVariant`,
//! which is part of the process-wide provider configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ErrorKind, GatewayError};

/// Default image size sent upstream.
pub const DEFAULT_SIZE: &str = "1024x1024";

/// Message used when no extraction path matched.
pub const NO_IMAGE_URL_MESSAGE: &str = "No image URL returned";

/// Message used when the core faulted unexpectedly.
pub const INTERNAL_ERROR_MESSAGE: &str = "Unexpected error while generating image";

// ─────────────────────────────────────────────
// Protocol variant
// ─────────────────────────────────────────────

/// Which request/response convention the upstream speaks.
///
/// Selects both the request builder branch and the response extraction order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVariant {
    /// `POST {endpoint}/openai/deployments/{deployment}/images/generations`
    #[default]
    #[serde(rename = "openai_rest", alias = "openAiRest", alias = "openai")]
    OpenAiRest,
    /// `POST {endpoint}/infer`
    #[serde(rename = "foundry_infer", alias = "foundryInfer", alias = "foundry")]
    FoundryInfer,
}

impl ProtocolVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVariant::OpenAiRest => "openai_rest",
            ProtocolVariant::FoundryInfer => "foundry_infer",
        }
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProtocolVariant {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "openai_rest" | "openairest" | "openai" | "rest" => Ok(ProtocolVariant::OpenAiRest),
            "foundry_infer" | "foundryinfer" | "foundry" | "infer" => {
                Ok(ProtocolVariant::FoundryInfer)
            }
            other => Err(GatewayError::Config(format!(
                "unknown protocol variant '{other}' (expected openai_rest or foundry_infer)"
            ))),
        }
    }
}

// ─────────────────────────────────────────────
// GenerationRequest
// ─────────────────────────────────────────────

/// One image generation request, built fresh per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Trimmed, never empty.
    pub prompt: String,
    pub size: String,
    /// Always 1; the gateway never batches.
    pub n: u32,
}

impl GenerationRequest {
    /// Trim the prompt and reject it if nothing is left.
    pub fn new(prompt: &str) -> Result<Self, GatewayError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GatewayError::EmptyPrompt);
        }
        Ok(Self {
            prompt: prompt.to_string(),
            size: DEFAULT_SIZE.to_string(),
            n: 1,
        })
    }

    /// Override the image size. Blank values keep the current size.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        let size = size.into();
        if !size.trim().is_empty() {
            self.size = size.trim().to_string();
        }
        self
    }
}

// ─────────────────────────────────────────────
// UpstreamResponse
// ─────────────────────────────────────────────

/// Upstream body: parsed JSON, or the raw text when it was not JSON.
#[derive(Clone, Debug, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    Text(String),
}

impl UpstreamBody {
    /// Parse bytes as JSON, keeping the lossy text on failure.
    pub fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => UpstreamBody::Json(value),
            Err(_) => UpstreamBody::Text(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The body as a JSON value for diagnostics (text becomes a JSON string).
    pub fn to_value(&self) -> Value {
        match self {
            UpstreamBody::Json(value) => value.clone(),
            UpstreamBody::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Raw outcome of the single upstream call.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: UpstreamBody) -> Self {
        Self { status, body }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, UpstreamBody::Json(body))
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, UpstreamBody::Text(body.into()))
    }

    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        Self::new(status, UpstreamBody::parse(bytes))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ─────────────────────────────────────────────
// GenerationResult
// ─────────────────────────────────────────────

/// The normalized outcome handed back to the front end.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerationResult {
    Success {
        image_url: String,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        raw_response: Option<Value>,
    },
}

impl GenerationResult {
    pub fn success(image_url: impl Into<String>) -> Self {
        GenerationResult::Success {
            image_url: image_url.into(),
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        GenerationResult::Failure {
            kind,
            message: message.into(),
            raw_response: None,
        }
    }

    /// Extraction found nothing; keep the body for diagnosis.
    pub fn no_image_url(raw_response: Value) -> Self {
        GenerationResult::Failure {
            kind: ErrorKind::NoImageUrl,
            message: NO_IMAGE_URL_MESSAGE.to_string(),
            raw_response: Some(raw_response),
        }
    }

    pub fn internal() -> Self {
        Self::failure(ErrorKind::InternalError, INTERNAL_ERROR_MESSAGE)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success { .. })
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { image_url } => Some(image_url),
            GenerationResult::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            GenerationResult::Success { .. } => None,
            GenerationResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// JSON body for the HTTP front end.
    ///
    /// `{"image_url": ...}` on success, `{"error", "kind", "raw_response"?}` otherwise.
    /// `raw_response` is only emitted for diagnostic kinds.
    pub fn to_response_body(&self) -> Value {
        match self {
            GenerationResult::Success { image_url } => json!({ "image_url": image_url }),
            GenerationResult::Failure {
                kind,
                message,
                raw_response,
            } => {
                let mut body = json!({ "error": message, "kind": kind });
                if let (true, Some(raw)) = (kind.is_diagnostic(), raw_response) {
                    body["raw_response"] = raw.clone();
                }
                body
            }
        }
    }
}

impl From<GatewayError> for GenerationResult {
    fn from(err: GatewayError) -> Self {
        GenerationResult::failure(err.kind(), err.to_string())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
