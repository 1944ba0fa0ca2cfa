//! Contracts for the extraction and generation engines.
//!
//! The coordinator never looks inside either engine; it only decides when to
//! call them. Concrete adapters live in `crate::engine`.

use anyhow::Result;
use async_trait::async_trait;

use super::entry::LAYER_MARK_ALL;
use super::tokens::TokenSet;

/// Scans source text for utility tokens.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Whether `id` (with content `code`) should be scanned at all.
    fn filter(&self, code: &str, id: &str) -> bool;

    /// Add the tokens found in `code` to `tokens`.
    async fn extract(&self, code: &str, id: &str, tokens: &TokenSet) -> Result<()>;
}

/// Turns a token set into layered CSS.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, tokens: &TokenSet) -> Result<GenerateResult>;
}

/// Generated CSS, one text block per layer, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResult {
    layers: Vec<(String, String)>,
}

impl GenerateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append CSS to `layer`, creating it if needed.
    pub fn push(&mut self, layer: impl Into<String>, css: impl AsRef<str>) {
        let layer = layer.into();
        let css = css.as_ref();
        match self.layers.iter_mut().find(|(name, _)| *name == layer) {
            Some((_, existing)) => {
                if !existing.is_empty() && !css.is_empty() {
                    existing.push('\n');
                }
                existing.push_str(css);
            }
            None => self.layers.push((layer, css.to_string())),
        }
    }

    pub fn with_layer(mut self, layer: impl Into<String>, css: impl AsRef<str>) -> Self {
        self.push(layer, css);
        self
    }

    /// Layer names in emission order.
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    /// CSS of a single layer (empty if the generator produced nothing for it).
    pub fn layer(&self, name: &str) -> String {
        if name == LAYER_MARK_ALL {
            return self.all();
        }
        self.layers
            .iter()
            .find(|(layer, _)| layer == name)
            .map(|(_, css)| css.clone())
            .unwrap_or_default()
    }

    /// Concatenated CSS of the named layers, in emission order.
    ///
    /// The all-layers marker selects every generated layer.
    pub fn layers<S: AsRef<str>>(&self, names: &[S]) -> String {
        let everything = names.iter().any(|n| n.as_ref() == LAYER_MARK_ALL);
        self.layers
            .iter()
            .filter(|(layer, _)| everything || names.iter().any(|n| n.as_ref() == layer))
            .map(|(_, css)| css.as_str())
            .filter(|css| !css.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Concatenated CSS of every layer not named in `excluded`, in emission order.
    pub fn layers_except<S: AsRef<str>>(&self, excluded: &[S]) -> String {
        self.layers
            .iter()
            .filter(|(layer, _)| !excluded.iter().any(|n| n.as_ref() == layer))
            .map(|(_, css)| css.as_str())
            .filter(|css| !css.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Concatenated CSS of every layer.
    pub fn all(&self) -> String {
        self.layers(&[LAYER_MARK_ALL])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerateResult {
        GenerateResult::new()
            .with_layer("preflights", "*{box-sizing:border-box}")
            .with_layer("default", ".p-4{padding:1rem}")
            .with_layer("icons", ".i-x{mask:url(x)}")
    }

    #[test]
    fn test_single_layer() {
        let result = sample();
        assert_eq!(result.layer("default"), ".p-4{padding:1rem}");
        assert_eq!(result.layer("missing"), "");
    }

    #[test]
    fn test_layers_keep_emission_order() {
        let result = sample();
        assert_eq!(
            result.layers(&["icons", "preflights"]),
            "*{box-sizing:border-box}\n.i-x{mask:url(x)}"
        );
    }

    #[test]
    fn test_all_marker_expands() {
        let result = sample();
        let all = result.layers(&["default", LAYER_MARK_ALL]);
        assert!(all.contains("box-sizing"));
        assert!(all.contains("padding"));
        assert!(all.contains("mask"));
        assert_eq!(result.layer(LAYER_MARK_ALL), all);
    }

    #[test]
    fn test_layers_except() {
        let result = sample();
        assert_eq!(
            result.layers_except(&["default"]),
            "*{box-sizing:border-box}\n.i-x{mask:url(x)}"
        );
        assert_eq!(result.layers_except::<&str>(&[]), result.all());
    }

    #[test]
    fn test_push_merges_same_layer() {
        let mut result = GenerateResult::new();
        result.push("default", ".a{}");
        result.push("default", ".b{}");
        assert_eq!(result.layer_names().count(), 1);
        assert_eq!(result.layer("default"), ".a{}\n.b{}");
    }
}
