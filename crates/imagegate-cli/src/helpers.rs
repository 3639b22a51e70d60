//! Shared CLI helpers — path expansion, result printing, version banner.

use std::path::PathBuf;

use colored::Colorize;

use imagegate_core::GenerationResult;

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Print a generation result to stdout (errors to stderr).
pub fn print_result(result: &GenerationResult) {
    match result {
        GenerationResult::Success { image_url } => {
            println!("{image_url}");
        }
        GenerationResult::Failure {
            kind,
            message,
            raw_response,
        } => {
            eprintln!("{} {} ({})", "✗".red().bold(), message, kind.to_string().dimmed());
            if let (true, Some(raw)) = (kind.is_diagnostic(), raw_response) {
                eprintln!("{}", "Upstream response:".dimmed());
                eprintln!("{}", serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string()));
            }
        }
    }
}

/// Print the banner shown when the server starts.
pub fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🖼  Imagegate".cyan().bold(), version.dimmed());
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_home() {
        let result = expand_tilde("~/foo/bar");
        assert!(result.ends_with("foo/bar"));
        assert!(!result.starts_with("~"));
    }

    #[test]
    fn expand_tilde_no_tilde() {
        let result = expand_tilde("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_tilde_relative() {
        let result = expand_tilde("relative/config.json");
        assert_eq!(result, PathBuf::from("relative/config.json"));
    }
}
