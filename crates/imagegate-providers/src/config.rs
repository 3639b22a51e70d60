//! Runtime provider configuration.
//!
//! Built once from [`ProviderSettings`] at startup, then shared read-only
//! (behind an `Arc`) by every request.

use std::time::Duration;

use imagegate_core::config::ProviderSettings;
use imagegate_core::{GatewayError, ProtocolVariant};

use crate::auth::AuthStrategy;

/// Immutable, process-wide provider configuration.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub deployment_name: String,
    pub api_version: Option<String>,
    /// Fixed generation URL (OpenAI REST only).
    pub request_url: Option<String>,
    pub protocol: ProtocolVariant,
    pub auth: AuthStrategy,
    pub quality: String,
    pub style: String,
    /// Size used when the request does not ask for one.
    pub size: String,
    /// Bound on the whole upstream call.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Minimal config; everything else takes the settings defaults.
    pub fn new(
        endpoint: &str,
        deployment_name: &str,
        protocol: ProtocolVariant,
        auth: AuthStrategy,
    ) -> Self {
        let defaults = ProviderSettings::default();
        Self {
            endpoint: endpoint.to_string(),
            deployment_name: deployment_name.to_string(),
            api_version: None,
            request_url: None,
            protocol,
            auth,
            quality: defaults.quality,
            style: defaults.style,
            size: defaults.size,
            timeout: Duration::from_secs(defaults.timeout_secs),
        }
    }

    /// Resolve loaded settings, including the auth strategy.
    ///
    /// Endpoint and deployment are checked when a request is built, so a
    /// half-configured gateway can still start and report `ConfigError`s.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let auth = AuthStrategy::from_settings(&settings.auth, timeout)?;

        Ok(Self {
            endpoint: settings.endpoint.trim().to_string(),
            deployment_name: settings.deployment_name.trim().to_string(),
            api_version: non_empty(settings.api_version.as_deref()),
            request_url: non_empty(settings.request_url.as_deref()),
            protocol: settings.protocol,
            auth,
            quality: settings.quality.clone(),
            style: settings.style.clone(),
            size: settings.size.clone(),
            timeout,
        })
    }

    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = Some(api_version.to_string());
        self
    }

    pub fn with_request_url(mut self, request_url: &str) -> Self {
        self.request_url = Some(request_url.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagegate_core::config::{AuthKind, AuthSettings};

    #[test]
    fn test_from_settings() {
        let settings = ProviderSettings {
            endpoint: " https://x/ ".into(),
            deployment_name: "dall-e-3".into(),
            api_version: Some("".into()),
            protocol: ProtocolVariant::FoundryInfer,
            timeout_secs: 0,
            auth: AuthSettings {
                kind: AuthKind::ApiKey,
                api_key: "k".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = ProviderConfig::from_settings(&settings).unwrap();
        assert_eq!(config.endpoint, "https://x/");
        assert_eq!(config.deployment_name, "dall-e-3");
        assert!(config.api_version.is_none());
        assert_eq!(config.protocol, ProtocolVariant::FoundryInfer);
        assert!(matches!(config.auth, AuthStrategy::StaticApiKey(_)));
        assert_eq!(config.timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_from_settings_bad_auth() {
        let settings = ProviderSettings {
            auth: AuthSettings {
                kind: AuthKind::BearerToken,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            ProviderConfig::from_settings(&settings),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ProviderConfig::new("https://x", "d", ProtocolVariant::OpenAiRest, AuthStrategy::NoAuth);
        assert_eq!(config.quality, "standard");
        assert_eq!(config.style, "vivid");
        assert_eq!(config.size, "1024x1024");
        assert_eq!(config.timeout, Duration::from_secs(120));
    }
}
