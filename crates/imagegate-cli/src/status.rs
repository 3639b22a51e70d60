//! `imagegate status` — show configuration and provider status.
//!
//! - Shows config path, endpoint, deployment, protocol
//! - Shows the auth mode (secrets masked)

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use imagegate_core::config::{AuthKind, Config};
use imagegate_core::utils::mask_secret;
use imagegate_providers::find_by_variant;

/// Run the status command.
pub fn run(config: &Config, config_path: &Path) -> Result<()> {
    let provider = &config.provider;

    println!();
    println!("{}", "🖼  Imagegate Status".cyan().bold());
    println!();

    // Config
    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );

    // Upstream
    println!("  {:<18} {}", "Endpoint:".bold(), or_unset(&provider.endpoint));
    println!("  {:<18} {}", "Deployment:".bold(), or_unset(&provider.deployment_name));
    println!(
        "  {:<18} {} {}",
        "Protocol:".bold(),
        find_by_variant(provider.protocol).display_name,
        format!("({})", provider.protocol).dimmed()
    );
    if let Some(ref version) = provider.api_version {
        println!("  {:<18} {}", "API version:".bold(), version);
    }
    if let Some(ref url) = provider.request_url {
        println!("  {:<18} {}", "Request URL:".bold(), url);
    }
    println!(
        "  {:<18} {} | quality: {} | style: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("size: {}", provider.size).dimmed(),
        provider.quality.dimmed(),
        provider.style.dimmed(),
        provider.timeout_secs,
    );

    // Auth
    println!();
    println!("  {:<18} {}", "Auth:".bold(), describe_auth(config));

    // Server
    println!(
        "  {:<18} http://{}:{}",
        "Server:".bold(),
        config.server.host,
        config.server.port
    );

    println!();
    if provider.is_configured() {
        println!("  {} ready", "✓".green());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "not configured: set an endpoint and deployment name".dimmed()
        );
    }
    println!();

    Ok(())
}

/// One-line auth summary. Keys and tokens are masked.
fn describe_auth(config: &Config) -> String {
    let auth = &config.provider.auth;
    let kind = auth.resolved_kind();
    let detail = match kind {
        AuthKind::ApiKey if auth.api_key.is_empty() => "· no key set".red().to_string(),
        AuthKind::ApiKey => format!("{} (key {})", "✓".green(), mask_secret(&auth.api_key)),
        AuthKind::BearerToken if auth.token.is_empty() => "· no token set".red().to_string(),
        AuthKind::BearerToken => format!("{} (token {})", "✓".green(), mask_secret(&auth.token)),
        AuthKind::AzureCli | AuthKind::ManagedIdentity => {
            format!("scope {}", auth.scope).dimmed().to_string()
        }
        AuthKind::None | AuthKind::Auto => String::new(),
    };

    if auth.kind == AuthKind::Auto {
        format!("{} {} {}", kind, "(auto)".dimmed(), detail)
    } else {
        format!("{} {}", kind, detail)
    }
}

fn or_unset(value: &str) -> String {
    if value.trim().is_empty() {
        "(not set)".red().to_string()
    } else {
        value.to_string()
    }
}
