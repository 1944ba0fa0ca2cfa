//! unodev - keeps utility-first stylesheets in sync with source edits.

mod actor;
mod cli;
mod config;
mod core;
mod embed;
mod engine;
mod logger;
mod reload;
mod style;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{DevConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(DevConfig::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(),
        Commands::Build { output } => cli::build::build(&config, output),
    }
}
