//! Request builder — turns a prompt into the exact upstream HTTP request.
//!
//! The only side effect is the token fetch for `BearerToken` auth; if that
//! fails no request is produced, so nothing is sent.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use imagegate_core::{GatewayError, GenerationRequest, ProtocolVariant};

use crate::auth::Credential;
use crate::config::ProviderConfig;
use crate::registry::{find_by_variant, KeyPlacement};

// ─────────────────────────────────────────────
// Wire bodies
// ─────────────────────────────────────────────

/// Body for `POST .../images/generations`.
#[derive(Debug, Serialize)]
pub struct OpenAiImageRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub size: &'a str,
    pub quality: &'a str,
    pub style: &'a str,
    pub n: u32,
}

/// Body for `POST {endpoint}/infer`.
#[derive(Debug, Serialize)]
pub struct InferRequest<'a> {
    pub inputs: InferInputs<'a>,
    pub deployment: &'a str,
}

#[derive(Debug, Serialize)]
pub struct InferInputs<'a> {
    pub prompt: &'a str,
}

// ─────────────────────────────────────────────
// UpstreamRequest
// ─────────────────────────────────────────────

/// A fully built upstream call, ready to send.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Build the upstream request for `request` under `config`.
///
/// Config is validated before the credential is resolved, so a broken config
/// never triggers a token fetch.
pub async fn build_request(
    request: &GenerationRequest,
    config: &ProviderConfig,
) -> Result<UpstreamRequest, GatewayError> {
    let url = build_url(config)?;
    let body = build_body(request, config)?;

    let credential = config.auth.resolve().await?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    apply_credential(&mut headers, credential, config.protocol)?;

    debug!(
        protocol = config.protocol.as_str(),
        url = %url,
        auth = %config.auth.describe(),
        "built upstream request"
    );

    Ok(UpstreamRequest { url, headers, body })
}

/// Target URL for the configured protocol.
pub fn build_url(config: &ProviderConfig) -> Result<Url, GatewayError> {
    let deployment = config.deployment_name.trim();
    if deployment.is_empty() {
        return Err(GatewayError::Config("deployment name is not configured".into()));
    }

    let fixed = match config.protocol {
        ProtocolVariant::OpenAiRest => config.request_url.as_deref(),
        ProtocolVariant::FoundryInfer => None,
    };

    let mut url = match fixed {
        Some(fixed) => parse_url(fixed)?,
        None => {
            let endpoint = config.endpoint.trim().trim_end_matches('/');
            if endpoint.is_empty() {
                return Err(GatewayError::Config("endpoint is not configured".into()));
            }
            let route = find_by_variant(config.protocol)
                .route
                .replace("{deployment}", deployment);
            parse_url(&format!("{endpoint}{route}"))?
        }
    };

    if config.protocol == ProtocolVariant::OpenAiRest {
        if let Some(ref version) = config.api_version {
            let has_version = url.query_pairs().any(|(k, _)| k == "api-version");
            if !has_version {
                url.query_pairs_mut().append_pair("api-version", version);
            }
        }
    }

    Ok(url)
}

/// JSON body for the configured protocol.
pub fn build_body(request: &GenerationRequest, config: &ProviderConfig) -> Result<Value, GatewayError> {
    let deployment = config.deployment_name.trim();
    let value = match config.protocol {
        ProtocolVariant::OpenAiRest => serde_json::to_value(OpenAiImageRequest {
            model: deployment,
            prompt: &request.prompt,
            size: &request.size,
            quality: &config.quality,
            style: &config.style,
            n: request.n,
        }),
        ProtocolVariant::FoundryInfer => serde_json::to_value(InferRequest {
            inputs: InferInputs {
                prompt: &request.prompt,
            },
            deployment,
        }),
    };
    value.map_err(|e| GatewayError::Config(format!("failed to encode request body: {e}")))
}

fn parse_url(raw: &str) -> Result<Url, GatewayError> {
    Url::parse(raw).map_err(|e| GatewayError::Config(format!("invalid upstream URL '{raw}': {e}")))
}

/// Put the credential where the protocol expects it.
///
/// Foundry carries static keys and tokens alike as bearer values.
fn apply_credential(
    headers: &mut HeaderMap,
    credential: Credential,
    protocol: ProtocolVariant,
) -> Result<(), GatewayError> {
    let (name, value) = match credential {
        Credential::None => return Ok(()),
        Credential::Bearer(token) => (AUTHORIZATION, format!("Bearer {token}")),
        Credential::ApiKey(key) => match find_by_variant(protocol).key_placement {
            KeyPlacement::ApiKeyHeader => (HeaderName::from_static("api-key"), key),
            KeyPlacement::Bearer => (AUTHORIZATION, format!("Bearer {key}")),
        },
    };

    let mut value = HeaderValue::from_str(&value).map_err(|_| {
        GatewayError::Auth("credential contains characters not allowed in an HTTP header".into())
    })?;
    value.set_sensitive(true);
    headers.insert(name, value);
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
