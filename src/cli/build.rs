//! One-shot stylesheet build.
//!
//! Scans the project root, extracts every accepted source and writes the
//! generator's full output (all layers, emission order) to a file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::DevConfig;
use crate::engine::{CommandGenerator, SplitExtractor, collect_sources, read_sources};
use crate::log;
use crate::style::{Extractor, Generator, TokenSet};

/// Build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub files: usize,
    pub tokens: usize,
    pub output: PathBuf,
}

/// Entry point of the `build` subcommand.
pub fn build(config: &DevConfig, output: &Path) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let report = rt.block_on(build_css(config, output))?;
    log!(
        "build";
        "{} tokens from {} files -> {}",
        report.tokens,
        report.files,
        config.root_relative(&report.output).display()
    );
    Ok(())
}

/// Extract from every source under the root and generate the stylesheet.
pub async fn build_css(config: &DevConfig, output: &Path) -> Result<BuildReport> {
    let extractor = SplitExtractor::from_config(&config.style)?;
    let files = collect_sources(config.get_root(), |id| extractor.matches_id(id));
    let sources = read_sources(&files);

    let tokens = TokenSet::new();
    for source in &sources {
        extractor
            .extract(&source.code, &source.id, &tokens)
            .await
            .with_context(|| format!("extract failed: {}", source.id))?;
    }

    let generated = CommandGenerator::from_config(config)
        .generate(&tokens)
        .await?;

    let output = config.root_join(output);
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, generated.all())
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(BuildReport {
        files: sources.len(),
        tokens: tokens.len(),
        output,
    })
}
