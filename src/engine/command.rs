//! Generator backed by an external CSS tool.
//!
//! Invocation: `<command> <state>/tokens.txt -o <state>/out.css`, run from the
//! project root. The tool's output is split into layers on
//! `/* layer: <name> */` markers; anything before the first marker belongs
//! to `default`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tokio::sync::Mutex;

use crate::config::DevConfig;
use crate::style::{GenerateResult, Generator, TokenSet};
use crate::utils::exec::Cmd;

const TOKENS_FILE: &str = "tokens.txt";
const OUTPUT_FILE: &str = "out.css";
const DEFAULT_LAYER: &str = "default";

static LAYER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*\s*layer:\s*([A-Za-z0-9_-]+)\s*\*/").expect("static regex")
});

/// Runs the configured command once per `generate` call.
pub struct CommandGenerator {
    command: Vec<String>,
    root: PathBuf,
    state_dir: PathBuf,
    /// Serializes runs; they share the scratch files.
    run_lock: Mutex<()>,
}

impl CommandGenerator {
    pub fn new(command: Vec<String>, root: impl Into<PathBuf>, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            root: root.into(),
            state_dir: state_dir.into(),
            run_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &DevConfig) -> Self {
        Self::new(config.style.command.clone(), config.get_root(), config.state_dir())
    }

    fn tokens_path(&self) -> PathBuf {
        self.state_dir.join(TOKENS_FILE)
    }

    fn output_path(&self) -> PathBuf {
        self.state_dir.join(OUTPUT_FILE)
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(&self, tokens: &TokenSet) -> Result<GenerateResult> {
        let _guard = self.run_lock.lock().await;

        tokio::fs::create_dir_all(&self.state_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.state_dir.display()))?;

        let tokens_path = self.tokens_path();
        let output_path = self.output_path();
        let mut input = tokens.snapshot().join("\n");
        input.push('\n');
        tokio::fs::write(&tokens_path, input)
            .await
            .with_context(|| format!("Failed to write {}", tokens_path.display()))?;

        Cmd::from_slice(&self.command)
            .arg(&tokens_path)
            .args([Path::new("-o"), output_path.as_path()])
            .cwd(&self.root)
            .quiet(true)
            .run()
            .await?;

        let css = tokio::fs::read_to_string(&output_path)
            .await
            .with_context(|| format!("Failed to read {}", output_path.display()))?;

        Ok(parse_layers(&css))
    }
}

/// Split generator output into layers on `/* layer: name */` markers.
pub fn parse_layers(css: &str) -> GenerateResult {
    let mut result = GenerateResult::new();
    let mut layer = DEFAULT_LAYER;
    let mut start = 0;

    for caps in LAYER_MARKER.captures_iter(css) {
        let (Some(marker), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_segment(&mut result, layer, &css[start..marker.start()]);
        layer = name.as_str();
        start = marker.end();
    }
    push_segment(&mut result, layer, &css[start..]);

    result
}

fn push_segment(result: &mut GenerateResult, layer: &str, css: &str) {
    let css = css.trim();
    if !css.is_empty() {
        result.push(layer, css);
    }
}
