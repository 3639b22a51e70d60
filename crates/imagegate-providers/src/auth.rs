//! Auth strategies and the built-in token sources.
//!
//! `AuthStrategy` is resolved once at startup from [`AuthSettings`]; the token
//! sources behind `BearerToken` are invoked per call.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};

use imagegate_core::config::{AuthKind, AuthSettings};
use imagegate_core::utils::truncate_string;
use imagegate_core::GatewayError;

use crate::traits::TokenSource;

/// Default IMDS token endpoint.
pub const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

// ─────────────────────────────────────────────
// AuthStrategy
// ─────────────────────────────────────────────

/// How the outbound request is authenticated.
#[derive(Clone)]
pub enum AuthStrategy {
    /// Static secret, read with no I/O.
    StaticApiKey(String),
    /// Token fetched from the source on every call.
    BearerToken(Arc<dyn TokenSource>),
    NoAuth,
}

impl std::fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStrategy::StaticApiKey(_) => f.write_str("StaticApiKey(***)"),
            AuthStrategy::BearerToken(source) => {
                write!(f, "BearerToken({})", source.display_name())
            }
            AuthStrategy::NoAuth => f.write_str("NoAuth"),
        }
    }
}

/// A credential resolved for one call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credential {
    ApiKey(String),
    Bearer(String),
    None,
}

impl AuthStrategy {
    /// Build the strategy selected by `settings`.
    ///
    /// `timeout` bounds every token fetch, over HTTP or through the Azure CLI.
    pub fn from_settings(settings: &AuthSettings, timeout: Duration) -> Result<Self, GatewayError> {
        match settings.resolved_kind() {
            AuthKind::ApiKey => {
                if settings.api_key.is_empty() {
                    return Err(GatewayError::Config(
                        "auth type apiKey requires provider.auth.apiKey".into(),
                    ));
                }
                Ok(AuthStrategy::StaticApiKey(settings.api_key.clone()))
            }
            AuthKind::BearerToken => {
                if settings.token.is_empty() {
                    return Err(GatewayError::Config(
                        "auth type bearerToken requires provider.auth.token".into(),
                    ));
                }
                Ok(AuthStrategy::BearerToken(Arc::new(StaticTokenSource::new(
                    &settings.token,
                ))))
            }
            AuthKind::AzureCli => Ok(AuthStrategy::BearerToken(Arc::new(
                AzureCliTokenSource::new(&settings.scope).with_timeout(timeout),
            ))),
            AuthKind::ManagedIdentity => {
                let source = ManagedIdentityTokenSource::from_settings(settings, timeout)?;
                Ok(AuthStrategy::BearerToken(Arc::new(source)))
            }
            AuthKind::None => Ok(AuthStrategy::NoAuth),
            AuthKind::Auto => Err(GatewayError::Config(
                "auth type auto did not resolve to a concrete strategy".into(),
            )),
        }
    }

    /// Resolve the credential for one call. Only `BearerToken` does I/O.
    pub async fn resolve(&self) -> Result<Credential, GatewayError> {
        match self {
            AuthStrategy::StaticApiKey(secret) => Ok(Credential::ApiKey(secret.clone())),
            AuthStrategy::BearerToken(source) => {
                debug!(source = source.display_name(), "fetching bearer token");
                let token = source.token().await.map_err(|e| match e {
                    GatewayError::Auth(_) => e,
                    other => GatewayError::Auth(other.to_string()),
                })?;
                if token.trim().is_empty() {
                    return Err(GatewayError::Auth(format!(
                        "{} returned an empty token",
                        source.display_name()
                    )));
                }
                Ok(Credential::Bearer(token.trim().to_string()))
            }
            AuthStrategy::NoAuth => Ok(Credential::None),
        }
    }

    /// Short description for status output. Never includes secrets.
    pub fn describe(&self) -> String {
        match self {
            AuthStrategy::StaticApiKey(_) => "static API key".to_string(),
            AuthStrategy::BearerToken(source) => format!("bearer token ({})", source.display_name()),
            AuthStrategy::NoAuth => "none".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Static token
// ─────────────────────────────────────────────

/// A pre-issued token handed back as-is.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String, GatewayError> {
        Ok(self.token.clone())
    }

    fn display_name(&self) -> &str {
        "static token"
    }
}

// ─────────────────────────────────────────────
// Azure CLI
// ─────────────────────────────────────────────

/// Developer credential: asks the signed-in Azure CLI for a token.
///
/// Runs `az account get-access-token --scope <scope> --query accessToken -o tsv`.
pub struct AzureCliTokenSource {
    program: String,
    scope: String,
    timeout: Duration,
}

impl AzureCliTokenSource {
    pub fn new(scope: &str) -> Self {
        Self {
            program: "az".to_string(),
            scope: scope.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Bound on one `az` invocation. The child is killed when it runs over.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a different executable (tests, non-standard installs).
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }
}

#[async_trait]
impl TokenSource for AzureCliTokenSource {
    async fn token(&self) -> Result<String, GatewayError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args([
                "account",
                "get-access-token",
                "--scope",
                self.scope.as_str(),
                "--query",
                "accessToken",
                "-o",
                "tsv",
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                error!(timeout_ms = self.timeout.as_millis() as u64, "azure cli token request timed out");
                GatewayError::Auth(format!(
                    "azure cli timed out after {:?} fetching a token",
                    self.timeout
                ))
            })?
            .map_err(|e| GatewayError::Auth(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(status = %output.status, "azure cli token request failed");
            return Err(GatewayError::Auth(format!(
                "azure cli exited with {}: {}",
                output.status,
                truncate_string(stderr.trim(), 300)
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(GatewayError::Auth("azure cli returned no token".into()));
        }
        Ok(token)
    }

    fn display_name(&self) -> &str {
        "azure cli"
    }
}

// ─────────────────────────────────────────────
// Managed identity
// ─────────────────────────────────────────────

#[derive(Deserialize)]
struct ManagedIdentityToken {
    access_token: String,
}

/// Token from the managed identity endpoint.
///
/// Talks to IMDS by default (`Metadata: true`). When an identity header is
/// present (App Service), it is sent as `X-IDENTITY-HEADER` instead.
pub struct ManagedIdentityTokenSource {
    client: reqwest::Client,
    endpoint: String,
    resource: String,
    client_id: Option<String>,
    identity_header: Option<String>,
}

impl ManagedIdentityTokenSource {
    pub fn new(
        endpoint: &str,
        scope: &str,
        client_id: Option<String>,
        identity_header: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            resource: scope_to_resource(scope),
            client_id,
            identity_header,
        })
    }

    /// Build from settings, picking up App Service's `IDENTITY_ENDPOINT` /
    /// `IDENTITY_HEADER` when no endpoint is configured.
    pub fn from_settings(settings: &AuthSettings, timeout: Duration) -> Result<Self, GatewayError> {
        let app_service = std::env::var("IDENTITY_ENDPOINT")
            .ok()
            .zip(std::env::var("IDENTITY_HEADER").ok());

        let (endpoint, identity_header) = match (&settings.identity_endpoint, app_service) {
            (Some(endpoint), _) => (endpoint.clone(), None),
            (None, Some((endpoint, header))) => (endpoint, Some(header)),
            (None, None) => (IMDS_TOKEN_ENDPOINT.to_string(), None),
        };

        Self::new(
            &endpoint,
            &settings.scope,
            settings.client_id.clone(),
            identity_header,
            timeout,
        )
    }

    fn api_version(&self) -> &'static str {
        if self.identity_header.is_some() {
            "2019-08-01"
        } else {
            "2018-02-01"
        }
    }
}

#[async_trait]
impl TokenSource for ManagedIdentityTokenSource {
    async fn token(&self) -> Result<String, GatewayError> {
        let mut query = vec![
            ("api-version", self.api_version().to_string()),
            ("resource", self.resource.clone()),
        ];
        if let Some(ref client_id) = self.client_id {
            query.push(("client_id", client_id.clone()));
        }

        let mut request = self.client.get(&self.endpoint).query(&query);
        request = match self.identity_header {
            Some(ref header) => request.header("X-IDENTITY-HEADER", header),
            None => request.header("Metadata", "true"),
        };

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("managed identity request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "managed identity token request rejected");
            return Err(GatewayError::Auth(format!(
                "managed identity endpoint returned {status}: {}",
                truncate_string(&body, 300)
            )));
        }

        let token: ManagedIdentityToken = response.json().await.map_err(|e| {
            GatewayError::Auth(format!("invalid managed identity token response: {e}"))
        })?;
        Ok(token.access_token)
    }

    fn display_name(&self) -> &str {
        "managed identity"
    }
}

/// `https://x/.default` → `https://x`
fn scope_to_resource(scope: &str) -> String {
    scope
        .strip_suffix("/.default")
        .unwrap_or(scope)
        .to_string()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
