//! Config loader — reads `~/.imagegate/config.json`, then layers env vars on top.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.imagegate/config.json` (or an explicit path)
//! 3. Plain deployment variables `ENDPOINT`, `MODEL_DEPLOYMENT`, `API_VERSION`, `API_KEY`
//!    (a `.env` file in the working directory is loaded first)
//! 4. Environment variables `IMAGEGATE_<SECTION>__<FIELD>` (override everything)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{AuthSettings, Config, ProviderSettings};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the given (or default) path + `.env` + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    match dotenvy::dotenv() {
        Ok(env_path) => debug!("Loaded environment from {}", env_path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path, &|key: &str| std::env::var(key).ok())
}

/// Load config from a specific file path, resolving env vars through `env`.
fn load_config_from_path(path: &Path, env: &dyn Fn(&str) -> Option<String>) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default(), env);
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default(), env);
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default(), env);
        }
    };

    apply_env_overrides(config, env)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Plain deployment variables are applied first:
/// - `ENDPOINT` → `provider.endpoint`
/// - `MODEL_DEPLOYMENT` → `provider.deployment_name`
/// - `API_VERSION` → `provider.api_version`
/// - `API_KEY` → `provider.auth.api_key`
///
/// Then `IMAGEGATE_<SECTION>__<FIELD>` (double underscore as delimiter):
/// - `IMAGEGATE_PROVIDER__ENDPOINT`, `__DEPLOYMENT_NAME`, `__API_VERSION`, `__REQUEST_URL`
/// - `IMAGEGATE_PROVIDER__PROTOCOL` (`openai_rest` | `foundry_infer`)
/// - `IMAGEGATE_PROVIDER__SIZE`, `__QUALITY`, `__STYLE`, `__TIMEOUT_SECS`
/// - `IMAGEGATE_PROVIDER__AUTH__TYPE`, `__API_KEY`, `__TOKEN`, `__SCOPE`, `__CLIENT_ID`,
///   `__IDENTITY_ENDPOINT`
/// - `IMAGEGATE_SERVER__HOST`, `IMAGEGATE_SERVER__PORT`
fn apply_env_overrides(mut config: Config, env: &dyn Fn(&str) -> Option<String>) -> Config {
    apply_plain_env(&mut config.provider, env);
    apply_provider_env(&mut config.provider, env);
    apply_auth_env(&mut config.provider.auth, env);

    // Server
    if let Some(val) = env("IMAGEGATE_SERVER__HOST") {
        config.server.host = val;
    }
    if let Some(val) = env("IMAGEGATE_SERVER__PORT") {
        match val.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => warn!("Ignoring invalid IMAGEGATE_SERVER__PORT: {}", val),
        }
    }

    config
}

fn apply_plain_env(provider: &mut ProviderSettings, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(val) = env("ENDPOINT") {
        provider.endpoint = val;
    }
    if let Some(val) = env("MODEL_DEPLOYMENT") {
        provider.deployment_name = val;
    }
    if let Some(val) = env("API_VERSION") {
        provider.api_version = Some(val);
    }
    if let Some(val) = env("API_KEY") {
        provider.auth.api_key = val;
    }
}

fn apply_provider_env(provider: &mut ProviderSettings, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(val) = env("IMAGEGATE_PROVIDER__ENDPOINT") {
        provider.endpoint = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__DEPLOYMENT_NAME") {
        provider.deployment_name = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__API_VERSION") {
        provider.api_version = Some(val);
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__REQUEST_URL") {
        provider.request_url = Some(val);
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__PROTOCOL") {
        match val.parse() {
            Ok(protocol) => provider.protocol = protocol,
            Err(e) => warn!("Ignoring IMAGEGATE_PROVIDER__PROTOCOL: {}", e),
        }
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__SIZE") {
        provider.size = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__QUALITY") {
        provider.quality = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__STYLE") {
        provider.style = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(secs) => provider.timeout_secs = secs,
            Err(_) => warn!("Ignoring invalid IMAGEGATE_PROVIDER__TIMEOUT_SECS: {}", val),
        }
    }
}

fn apply_auth_env(auth: &mut AuthSettings, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__TYPE") {
        match val.parse() {
            Ok(kind) => auth.kind = kind,
            Err(e) => warn!("Ignoring IMAGEGATE_PROVIDER__AUTH__TYPE: {}", e),
        }
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__API_KEY") {
        auth.api_key = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__TOKEN") {
        auth.token = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__SCOPE") {
        auth.scope = val;
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__CLIENT_ID") {
        auth.client_id = Some(val);
    }
    if let Some(val) = env("IMAGEGATE_PROVIDER__AUTH__IDENTITY_ENDPOINT") {
        auth.identity_endpoint = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AuthKind;
    use crate::types::ProtocolVariant;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"), &no_env);
        assert_eq!(config.provider.timeout_secs, 120);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(r#"{
            "provider": {
                "endpoint": "https://res.openai.azure.com",
                "deploymentName": "dall-e-3",
                "timeoutSecs": 30
            }
        }"#);

        let config = load_config_from_path(file.path(), &no_env);
        assert_eq!(config.provider.endpoint, "https://res.openai.azure.com");
        assert_eq!(config.provider.deployment_name, "dall-e-3");
        assert_eq!(config.provider.timeout_secs, 30);
        // Default preserved
        assert_eq!(config.provider.quality, "standard");
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path(), &no_env);
        assert_eq!(config.provider.timeout_secs, 120);
        assert!(config.provider.endpoint.is_empty());
    }

    #[test]
    fn test_load_empty_json() {
        let file = write_temp_json("{}");
        let config = load_config_from_path(file.path(), &no_env);
        assert_eq!(config.provider.protocol, ProtocolVariant::OpenAiRest);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.provider.deployment_name = "dall-e-3".to_string();
        config.provider.protocol = ProtocolVariant::FoundryInfer;
        config.provider.auth.api_key = "k".to_string();

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path, &no_env);
        assert_eq!(reloaded.provider.deployment_name, "dall-e-3");
        assert_eq!(reloaded.provider.protocol, ProtocolVariant::FoundryInfer);
        assert_eq!(reloaded.provider.auth.api_key, "k");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        save_config(&Config::default(), Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["provider"].get("deploymentName").is_some());
        assert!(raw["provider"].get("deployment_name").is_none());
        assert_eq!(raw["provider"]["auth"]["type"], "auto");
    }

    #[test]
    fn test_plain_env_vars() {
        let env = env_from(&[
            ("ENDPOINT", "https://legacy.openai.azure.com"),
            ("MODEL_DEPLOYMENT", "dall-e-3"),
            ("API_VERSION", "2024-02-01"),
            ("API_KEY", "legacy-key"),
        ]);
        let config = apply_env_overrides(Config::default(), &env);
        assert_eq!(config.provider.endpoint, "https://legacy.openai.azure.com");
        assert_eq!(config.provider.deployment_name, "dall-e-3");
        assert_eq!(config.provider.api_version.as_deref(), Some("2024-02-01"));
        assert_eq!(config.provider.auth.api_key, "legacy-key");
    }

    #[test]
    fn test_namespaced_env_wins_over_plain() {
        let env = env_from(&[
            ("ENDPOINT", "https://legacy"),
            ("IMAGEGATE_PROVIDER__ENDPOINT", "https://namespaced"),
        ]);
        let config = apply_env_overrides(Config::default(), &env);
        assert_eq!(config.provider.endpoint, "https://namespaced");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_temp_json(r#"{ "provider": { "deploymentName": "from-file" } }"#);
        let env = env_from(&[("IMAGEGATE_PROVIDER__DEPLOYMENT_NAME", "from-env")]);
        let config = load_config_from_path(file.path(), &env);
        assert_eq!(config.provider.deployment_name, "from-env");
    }

    #[test]
    fn test_env_protocol_and_auth() {
        let env = env_from(&[
            ("IMAGEGATE_PROVIDER__PROTOCOL", "foundry"),
            ("IMAGEGATE_PROVIDER__AUTH__TYPE", "managed_identity"),
            ("IMAGEGATE_PROVIDER__AUTH__CLIENT_ID", "abc-123"),
        ]);
        let config = apply_env_overrides(Config::default(), &env);
        assert_eq!(config.provider.protocol, ProtocolVariant::FoundryInfer);
        assert_eq!(config.provider.auth.kind, AuthKind::ManagedIdentity);
        assert_eq!(config.provider.auth.client_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let env = env_from(&[
            ("IMAGEGATE_PROVIDER__PROTOCOL", "grpc"),
            ("IMAGEGATE_PROVIDER__TIMEOUT_SECS", "soon"),
            ("IMAGEGATE_SERVER__PORT", "99999"),
        ]);
        let config = apply_env_overrides(Config::default(), &env);
        assert_eq!(config.provider.protocol, ProtocolVariant::OpenAiRest);
        assert_eq!(config.provider.timeout_secs, 120);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_env_server_port() {
        let env = env_from(&[("IMAGEGATE_SERVER__PORT", "8080")]);
        let config = apply_env_overrides(Config::default(), &env);
        assert_eq!(config.server.port, 8080);
    }
}
