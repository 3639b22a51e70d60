//! `imagegate init` — write a starter config file.
//!
//! - Creates `~/.imagegate/config.json` (or the `--config` path) with defaults
//! - Values already present in the environment are captured into the file

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use imagegate_core::config::{save_config, Config};

/// Run the init command.
pub fn run(config: &Config, config_path: &Path) -> Result<()> {
    println!();
    println!("{}", "🖼  Imagegate — Setup".cyan().bold());
    println!();

    if config_path.exists() {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    } else {
        save_config(config, Some(config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!(
            "  {} created config at {}",
            "✓".green(),
            config_path.display()
        );
    }

    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Set provider.endpoint and provider.deploymentName in the config");
    println!("     (or ENDPOINT / MODEL_DEPLOYMENT in the environment)");
    println!("  2. Pick provider.protocol: openai_rest or foundry_infer");
    println!("  3. Check everything with {}", "imagegate status".cyan());
    println!("  4. Start the server with {}", "imagegate serve".cyan());
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.provider.deployment_name = "dall-e-3".into();
        run(&config, &path).unwrap();
        assert!(path.exists());

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"deploymentName\": \"dall-e-3\""));

        // A second run leaves the file alone
        config.provider.deployment_name = "other".into();
        run(&config, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), written);
    }
}
