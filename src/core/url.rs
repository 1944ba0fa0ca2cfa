//! Dev-server URL helpers: base path, origin, request paths.

use percent_encoding::percent_decode_str;

/// Hosts that mean "every interface" and are shown as `localhost`.
const WILDCARD_HOSTS: [&str; 3] = ["0.0.0.0", "::", "[::]"];

/// Normalize a configured base path.
///
/// `""` and `"/"` become `""`; anything else gets exactly one leading slash
/// and no trailing slash (`"app/"` → `"/app"`).
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Browser-facing origin of the dev server.
///
/// A missing or wildcard host becomes `localhost`; a missing port becomes 3000.
pub fn dev_origin(host: Option<&str>, port: Option<u16>, https: bool) -> String {
    let host = match host.map(str::trim) {
        None | Some("") => "localhost",
        Some(h) if WILDCARD_HOSTS.contains(&h) => "localhost",
        Some(h) => h,
    };
    let port = port.unwrap_or(3000);
    let scheme = if https { "https" } else { "http" };
    format!("{scheme}://{host}:{port}")
}

/// Strip a normalized base from a request URL.
///
/// Returns `None` if the URL is outside the base. An empty base strips nothing.
pub fn strip_base<'a>(url: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(url);
    }
    let rest = url.strip_prefix(base)?;
    match rest.chars().next() {
        None => Some("/"),
        Some('/' | '?') => Some(rest),
        Some(_) => None,
    }
}

/// Decode a request path: drop query and fragment, percent-decode.
pub fn decode_request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    percent_decode_str(path)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
