//! Rewrites applied to served source text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::embed::serve::client_tag;

/// Bare imports of a virtual style entry: `import "uno.css"`,
/// `import 'virtual:uno:base.css'`, `import("uno.css")`.
static ENTRY_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\bimport\s*\(?\s*)(["'])((?:virtual:)?uno(?::[\w-]+)?\.css)["']"#)
        .expect("static regex")
});

/// Prefix for specifiers the host resolves itself.
pub const ID_PREFIX: &str = "/@id/";

/// Point bare virtual-entry imports at the host's `/@id/` route.
pub fn rewrite_entry_imports<'a>(code: &'a str, base: &str) -> Cow<'a, str> {
    ENTRY_IMPORT.replace_all(code, |caps: &regex::Captures| {
        let quote = &caps[2];
        format!("{}{quote}{base}{ID_PREFIX}{}{quote}", &caps[1], &caps[3])
    })
}

/// Inject the client runtime tag before `</body>` (or append).
pub fn inject_client(html: &str, base: &str) -> String {
    let tag = client_tag(base);
    match rfind_ignore_case(html, "</body>") {
        Some(pos) => format!("{}{tag}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{tag}"),
    }
}

fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .rposition(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}
