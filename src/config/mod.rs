//! Project configuration management for `unodev.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── serve      # [serve]
//! │   └── style      # [style]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # DevConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section   | Purpose                                           |
//! |-----------|---------------------------------------------------|
//! | `[serve]` | Dev server (host, port, base, ssr, watch, ws)     |
//! | `[style]` | Extraction filter, generator command, timings     |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{ResolvedServe, ServeConfig, StyleConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    cli::{Cli, Commands, ServeArgs},
    core::BuildMode,
    log,
    style::StyleOptions,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Directory (under the root) for generator scratch files.
pub const STATE_DIR: &str = ".unodev";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing unodev.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Command being run (internal use only)
    #[serde(skip)]
    pub mode: BuildMode,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Extraction and generation settings
    #[serde(default)]
    pub style: StyleConfig,
}

impl DevConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, the cwd is
    /// the root and every section takes its defaults.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = path;
                config
            }
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                Self {
                    root: cwd.clone(),
                    config_path: cwd.join(&cli.config),
                    ..Self::default()
                }
            }
        };

        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Scratch directory for generator input and output.
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Coordinator options derived from `[serve]` and `[style]`.
    ///
    /// `http_port` is the port the HTTP server actually bound, which differs
    /// from `serve.port` after a bind retry.
    pub fn style_options(&self, http_port: u16) -> StyleOptions {
        let ResolvedServe { base, origin } = self.serve.resolve_bound(http_port);
        StyleOptions {
            debounce: self.style.debounce(),
            warn_timeout: self.style.warn_timeout(),
            base,
            origin,
            inject_ready: self.mode.inject_ready(self.serve.ssr),
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Serve { args } => {
                self.mode = BuildMode::Serve;
                self.apply_serve_args(args);
            }
            Commands::Build { .. } => {
                self.mode = BuildMode::Build;
            }
        }
    }

    /// Apply serve arguments from CLI.
    fn apply_serve_args(&mut self, args: &ServeArgs) {
        if let Some(host) = &args.host {
            self.serve.host = Some(host.clone());
        }
        if let Some(port) = args.port {
            self.serve.port = Some(port);
        }
        Self::update_option(&mut self.serve.base, args.base.as_ref());
        Self::update_option(&mut self.serve.ssr, args.ssr.as_ref());
        Self::update_option(&mut self.serve.watch, args.watch.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration for the current command.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.style.validate(&mut diag);
        if self.mode.is_serve() {
            self.serve.validate(&mut diag);
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> DevConfig {
    let (parsed, ignored) = DevConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
