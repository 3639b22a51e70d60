//! HTTP image gateway — the one outbound call per generation.
//!
//! `ImageGateway` glues the pieces together: build the request for the
//! configured protocol, send it once with the configured timeout, then hand
//! whatever came back to the normalizer. Every failure is folded into a
//! [`GenerationResult`], so callers never see a `Result`.

use std::error::Error as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use imagegate_core::config::ProviderSettings;
use imagegate_core::utils::truncate_string;
use imagegate_core::{GatewayError, GenerationRequest, GenerationResult, UpstreamResponse};

use crate::config::ProviderConfig;
use crate::normalize::normalize;
use crate::registry::find_by_variant;
use crate::request::build_request;
use crate::traits::ImageGenerator;

// ─────────────────────────────────────────────
// ImageGateway
// ─────────────────────────────────────────────

/// The real [`ImageGenerator`]: a pooled HTTP client plus the shared config.
pub struct ImageGateway {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

impl std::fmt::Debug for ImageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGateway")
            .field("endpoint", &self.config.endpoint)
            .field("deployment", &self.config.deployment_name)
            .field("protocol", &self.config.protocol)
            .field("auth", &self.config.auth.describe())
            .finish()
    }
}

impl ImageGateway {
    pub fn new(config: ProviderConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Resolve loaded settings and build the gateway.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, GatewayError> {
        Self::new(ProviderConfig::from_settings(settings)?)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Generate from a bare prompt at the configured default size.
    pub async fn generate_prompt(&self, prompt: &str) -> GenerationResult {
        match GenerationRequest::new(prompt) {
            Ok(request) => {
                let request = request.with_size(self.config.size.as_str());
                self.generate(&request).await
            }
            Err(e) => e.into(),
        }
    }

    async fn send(&self, request: &GenerationRequest) -> Result<UpstreamResponse, GatewayError> {
        let upstream = build_request(request, &self.config).await?;

        let response = self
            .client
            .post(upstream.url.clone())
            .headers(upstream.headers)
            .json(&upstream.body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;

        debug!(
            status,
            bytes = bytes.len(),
            body = %truncate_string(&String::from_utf8_lossy(&bytes), 300),
            "upstream response received"
        );

        Ok(UpstreamResponse::from_bytes(status, &bytes))
    }
}

#[async_trait]
impl ImageGenerator for ImageGateway {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        info!(
            protocol = self.config.protocol.as_str(),
            deployment = %self.config.deployment_name,
            size = %request.size,
            prompt = %truncate_string(&request.prompt, 80),
            "Generating image"
        );

        match self.send(request).await {
            Ok(response) => normalize(&response, self.config.protocol),
            Err(e) => {
                error!(kind = %e.kind(), error = %e, "Image generation failed");
                e.into()
            }
        }
    }

    fn display_name(&self) -> &str {
        find_by_variant(self.config.protocol).display_name
    }
}

/// Describe a reqwest failure, keeping the underlying cause.
fn transport_error(e: &reqwest::Error) -> GatewayError {
    let mut message = if e.is_timeout() {
        format!("timed out: {e}")
    } else {
        e.to_string()
    };

    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    GatewayError::Transport(message)
}

// ─────────────────────────────────────────────
// Fault isolation
// ─────────────────────────────────────────────

/// Run one generation on its own task.
///
/// A panic anywhere in the generator becomes `InternalError` instead of
/// taking down the caller.
pub async fn generate_guarded(
    generator: Arc<dyn ImageGenerator>,
    request: GenerationRequest,
) -> GenerationResult {
    let handle = tokio::spawn(async move { generator.generate(&request).await });

    match handle.await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "Image generation task aborted");
            GenerationResult::internal()
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
