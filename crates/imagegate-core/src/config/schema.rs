//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProviderSettings` (→ `AuthSettings`), `ServerConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::types::{ProtocolVariant, DEFAULT_SIZE};

/// Default token scope for Azure Cognitive Services.
pub const DEFAULT_TOKEN_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.imagegate/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub provider: ProviderSettings,
    pub server: ServerConfig,
}

// ─────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────

/// Upstream image provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Base URL, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// Deployment (model) name, e.g. `dall-e-3`.
    pub deployment_name: String,
    /// Sent as the `api-version` query parameter (OpenAI REST only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Fixed generation URL that already encodes deployment and version.
    /// Overrides the URL built from `endpoint` (OpenAI REST only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    pub protocol: ProtocolVariant,
    pub size: String,
    pub quality: String,
    pub style: String,
    /// Upper bound for the whole upstream call.
    pub timeout_secs: u64,
    pub auth: AuthSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment_name: String::new(),
            api_version: None,
            request_url: None,
            protocol: ProtocolVariant::default(),
            size: DEFAULT_SIZE.to_string(),
            quality: "standard".to_string(),
            style: "vivid".to_string(),
            timeout_secs: 120,
            auth: AuthSettings::default(),
        }
    }
}

impl ProviderSettings {
    /// Whether the minimum needed to reach an upstream is present.
    ///
    /// `requestUrl` only stands in for the endpoint under OpenAI REST; Foundry
    /// always builds its URL from `endpoint`.
    pub fn is_configured(&self) -> bool {
        let fixed_url = self.protocol == ProtocolVariant::OpenAiRest
            && self
                .request_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty());
        !self.deployment_name.trim().is_empty() && (!self.endpoint.trim().is_empty() || fixed_url)
    }
}

// ─────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────

/// How the outbound call authenticates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthKind {
    /// `ApiKey` when a key is set, otherwise `AzureCli`.
    #[default]
    Auto,
    ApiKey,
    /// A pre-issued bearer token.
    BearerToken,
    /// Token from `az account get-access-token`.
    AzureCli,
    /// Token from the managed identity endpoint.
    ManagedIdentity,
    None,
}

impl AuthKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthKind::Auto => "auto",
            AuthKind::ApiKey => "apiKey",
            AuthKind::BearerToken => "bearerToken",
            AuthKind::AzureCli => "azureCli",
            AuthKind::ManagedIdentity => "managedIdentity",
            AuthKind::None => "none",
        }
    }
}

impl std::fmt::Display for AuthKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "auto" | "" => Ok(AuthKind::Auto),
            "apikey" | "key" | "static" => Ok(AuthKind::ApiKey),
            "bearertoken" | "bearer" | "token" => Ok(AuthKind::BearerToken),
            "azurecli" | "cli" => Ok(AuthKind::AzureCli),
            "managedidentity" | "msi" => Ok(AuthKind::ManagedIdentity),
            "none" | "noauth" => Ok(AuthKind::None),
            _ => Err(GatewayError::Config(format!("unknown auth type '{}'", s.trim()))),
        }
    }
}

/// Credential material for the selected [`AuthKind`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    #[serde(rename = "type")]
    pub kind: AuthKind,
    pub api_key: String,
    /// Pre-issued token for `bearerToken`.
    pub token: String,
    /// OAuth scope requested by token-based kinds.
    pub scope: String,
    /// User-assigned managed identity client id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Override for the managed identity token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_endpoint: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            kind: AuthKind::Auto,
            api_key: String::new(),
            token: String::new(),
            scope: DEFAULT_TOKEN_SCOPE.to_string(),
            client_id: None,
            identity_endpoint: None,
        }
    }
}

impl AuthSettings {
    /// Resolve `Auto` into a concrete kind.
    pub fn resolved_kind(&self) -> AuthKind {
        match self.kind {
            AuthKind::Auto if !self.api_key.is_empty() => AuthKind::ApiKey,
            AuthKind::Auto => AuthKind::AzureCli,
            kind => kind,
        }
    }
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP front end bind address.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
