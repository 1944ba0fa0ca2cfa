//! Default extractor: split source text into candidate tokens.
//!
//! Every piece between separators is a candidate; the generator decides
//! which ones are real utilities. Over-extraction is harmless.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

use crate::config::StyleConfig;
use crate::style::{Extractor, TokenSet};

/// Separators: whitespace, quotes, backticks, `;`, `{`, `}`, optionally
/// preceded by an escaping `\` or a trailing `:`.
static SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\:]?[\s'"`;{}]+"#).expect("static regex"));

/// Candidates must contain a letter (or `?` for variant groups).
static VALID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z?]").expect("static regex"));

/// Split `code` into candidate tokens.
pub fn split_code(code: &str) -> impl Iterator<Item = &str> {
    SPLIT_RE
        .split(code)
        .filter(|piece| !piece.is_empty() && VALID_RE.is_match(piece))
}

/// Filtered splitting extractor.
pub struct SplitExtractor {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl SplitExtractor {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    pub fn from_config(style: &StyleConfig) -> Result<Self> {
        Self::new(&style.include, &style.exclude)
    }

    /// Exclusion wins; an empty include list accepts everything else.
    pub fn matches_id(&self, id: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(id)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(id))
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Regex::new(p).with_context(|| format!("invalid pattern `{p}`"))
        })
        .collect()
}

#[async_trait]
impl Extractor for SplitExtractor {
    fn filter(&self, _code: &str, id: &str) -> bool {
        self.matches_id(id)
    }

    async fn extract(&self, code: &str, id: &str, tokens: &TokenSet) -> Result<()> {
        let added = tokens.extend(split_code(code));
        if added > 0 {
            crate::debug!("extract"; "{}: +{} (total {})", id, added, tokens.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(code: &str) -> Vec<&str> {
        split_code(code).collect()
    }

    #[test]
    fn test_split_html_attribute() {
        assert_eq!(
            pieces(r#"<div class="p-4 text-red-500">"#),
            vec!["<div", "class=", "p-4", "text-red-500"]
        );
    }

    #[test]
    fn test_split_template_literal_and_css_block() {
        assert_eq!(
            pieces("const c = `m-2 ${x}`;\n.a{color:red}"),
            vec!["const", "c", "m-2", "${x", ".a", "color:red"]
        );
    }

    #[test]
    fn test_split_escaped_quote_and_colon() {
        assert_eq!(pieces(r#"hover:\"x "#), vec!["hover:", "x"]);
        assert_eq!(pieces("a: b"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_skips_letterless_pieces() {
        assert_eq!(pieces("1 + 2 = 3 ? ok"), vec!["?", "ok"]);
    }

    #[test]
    fn test_filter_include_exclude() {
        let extractor =
            SplitExtractor::new(&[r"\.tsx?$", r"\.html$"], &["node_modules"]).unwrap();
        assert!(extractor.matches_id("/src/App.tsx"));
        assert!(extractor.matches_id("/index.html"));
        assert!(!extractor.matches_id("/src/app.css"));
        assert!(!extractor.matches_id("/node_modules/x/index.ts"));
    }

    #[test]
    fn test_empty_include_accepts_all() {
        let empty: [&str; 0] = [];
        let extractor = SplitExtractor::new(&empty, &empty).unwrap();
        assert!(extractor.matches_id("/anything.xyz"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(SplitExtractor::new(&["("], &[]).is_err());
    }

    #[tokio::test]
    async fn test_extract_adds_tokens() {
        let empty: [&str; 0] = [];
        let extractor = SplitExtractor::new(&empty, &empty).unwrap();
        let tokens = TokenSet::new();
        extractor
            .extract(r#"<p class="m-1 m-1 p-2">"#, "/a.html", &tokens)
            .await
            .unwrap();
        assert!(tokens.contains("m-1"));
        assert!(tokens.contains("p-2"));
        assert_eq!(tokens.len(), 4);
    }
}
