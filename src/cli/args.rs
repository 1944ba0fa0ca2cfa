//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// unodev: keeps utility-first stylesheets in sync with source edits
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: unodev.toml)
    #[arg(short = 'C', long, global = true, default_value = "unodev.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start development server with live style updates
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },

    /// Generate the stylesheet once and exit
    #[command(visible_alias = "b")]
    Build {
        /// Output file (relative to project root)
        #[arg(short, long, default_value = "uno.css", value_hint = clap::ValueHint::FilePath)]
        output: PathBuf,
    },
}

/// Serve command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Host to bind (e.g., 127.0.0.1, 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Port number to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Public base path (e.g., /app/)
    #[arg(long)]
    pub base: Option<String>,

    /// Pages are server-rendered (disables the readiness snippet)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub ssr: Option<bool>,

    /// Enable file watching for live extraction
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,
}

impl Cli {
    pub const fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from(["unodev", "serve", "-p", "5173", "--watch", "false", "-v"]);
        assert!(cli.is_serve());
        assert!(cli.verbose);
        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(5173));
        assert_eq!(args.watch, Some(false));
        assert_eq!(args.ssr, None);
    }

    #[test]
    fn test_build_output_default() {
        let cli = Cli::parse_from(["unodev", "-C", "custom.toml", "build"]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        let Commands::Build { output } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(output, PathBuf::from("uno.css"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
