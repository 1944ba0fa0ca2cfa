//! `[style]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [style]
//! include = ['\.(html|vue|svelte|[jt]sx?|mdx?)$']
//! exclude = ['node_modules', '\.git/']
//! command = ["npx", "unocss"]   # runs: <command> .unodev/tokens.txt -o .unodev/out.css
//! debounce = 10                 # ms of quiet before an update is pushed
//! warn_timeout = 2000           # ms before warning about a missing entry import
//! ```

use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Package runners that fetch the real command on demand.
const PACKAGE_RUNNERS: [&str; 5] = ["npx", "bunx", "pnpx", "yarn", "dlx"];

/// Extraction and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Module ids (paths) to extract from, as regexes.
    pub include: Vec<String>,
    /// Module ids to skip, as regexes. Checked before `include`.
    pub exclude: Vec<String>,
    /// Generator command (e.g. `["unocss"]` or `["npx", "unocss"]`).
    pub command: Vec<String>,
    /// Debounce window in milliseconds.
    pub debounce: u64,
    /// Missing-entry warning delay in milliseconds.
    pub warn_timeout: u64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            include: vec![r"\.(html?|vue|svelte|astro|[cm]?[jt]sx?|mdx?)($|\?)".into()],
            exclude: vec![r"node_modules".into(), r"\.git/".into(), r"\.unodev/".into()],
            command: vec!["unocss".into()],
            debounce: 10,
            warn_timeout: 2000,
        }
    }
}

impl StyleConfig {
    pub const FIELDS: StyleFields = StyleFields {
        include: FieldPath::new("style.include"),
        exclude: FieldPath::new("style.exclude"),
        command: FieldPath::new("style.command"),
    };

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce)
    }

    pub fn warn_timeout(&self) -> Duration {
        Duration::from_millis(self.warn_timeout)
    }

    /// Validate style configuration.
    ///
    /// # Checks
    /// - every `include` / `exclude` entry compiles as a regex
    /// - `command` is non-empty and `command[0]` is installed (or a package runner)
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, patterns) in [
            (Self::FIELDS.include, &self.include),
            (Self::FIELDS.exclude, &self.exclude),
        ] {
            for pattern in patterns {
                if let Err(e) = Regex::new(pattern) {
                    diag.error(field, format!("invalid pattern `{pattern}`: {e}"));
                }
            }
        }

        let Some(cmd) = self.command.first() else {
            diag.error(
                Self::FIELDS.command,
                format!("{} is empty", Self::FIELDS.command),
            );
            return;
        };

        if which::which(cmd).is_ok() {
            return;
        }
        if PACKAGE_RUNNERS.contains(&cmd.as_str()) {
            if let Some(pkg) = self.command.get(1) {
                diag.hint(
                    Self::FIELDS.command,
                    format!("`{pkg}` via `{cmd}`, ensure package is installed"),
                );
            }
        } else {
            diag.error_with_hint(
                Self::FIELDS.command,
                format!("`{cmd}` not found"),
                format!("install the command or update {}", Self::FIELDS.command),
            );
        }
    }
}

/// Field paths of `[style]` for diagnostics.
pub struct StyleFields {
    pub include: FieldPath,
    pub exclude: FieldPath,
    pub command: FieldPath,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.style.command, vec!["unocss"]);
        assert_eq!(config.style.debounce(), Duration::from_millis(10));
        assert_eq!(config.style.warn_timeout(), Duration::from_millis(2000));
        assert!(!config.style.include.is_empty());
    }

    #[test]
    fn test_style_config() {
        let config = test_parse_config(
            r#"
[style]
include = ['\.tsx$']
exclude = []
command = ["npx", "unocss"]
debounce = 50
"#,
        );
        assert_eq!(config.style.include, vec![r"\.tsx$"]);
        assert!(config.style.exclude.is_empty());
        assert_eq!(config.style.command, vec!["npx", "unocss"]);
        assert_eq!(config.style.debounce(), Duration::from_millis(50));
        // untouched
        assert_eq!(config.style.warn_timeout, 2000);
    }

    #[test]
    fn test_validate_bad_regex() {
        let config = test_parse_config("[style]\ninclude = ['(']\ncommand = [\"npx\"]");
        let mut diag = ConfigDiagnostics::new();
        config.style.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "style.include");
    }

    #[test]
    fn test_validate_empty_command() {
        let config = test_parse_config("[style]\ncommand = []");
        let mut diag = ConfigDiagnostics::new();
        config.style.validate(&mut diag);
        assert_eq!(diag.errors()[0].field.as_str(), "style.command");
    }

    #[test]
    fn test_validate_missing_command() {
        let config = test_parse_config("[style]\ncommand = [\"unodev-definitely-not-installed\"]");
        let mut diag = ConfigDiagnostics::new();
        config.style.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
