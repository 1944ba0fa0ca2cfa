//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! host = "0.0.0.0"     # Bind address; shown to the browser as localhost
//! port = 5173          # HTTP port number (default 3000)
//! https = false        # Origin scheme used by the readiness ping
//! base = "/app/"       # Public base path
//! ssr = false          # Pages are server-rendered (no readiness snippet)
//! watch = true         # Watch the root and extract on change
//! ws_port = 24678      # Live-update WebSocket port
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::{dev_origin, normalize_base};

/// Development server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Bind address. `None` or `0.0.0.0` shows as `localhost`.
    pub host: Option<String>,

    /// HTTP port number. `None` means 3000.
    pub port: Option<u16>,

    /// Whether the dev server is reached over https.
    pub https: bool,

    /// Public base path.
    pub base: String,

    /// Pages are rendered on the server.
    pub ssr: bool,

    /// Enable file watcher for live extraction.
    pub watch: bool,

    /// WebSocket port for live updates.
    pub ws_port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            https: false,
            base: "/".into(),
            ssr: false,
            watch: true,
            ws_port: 24678,
        }
    }
}

/// Values derived from `[serve]` once at config resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServe {
    /// `""` or `/prefix` without trailing slash.
    pub base: String,
    /// e.g. `http://localhost:3000`
    pub origin: String,
}

impl ServeConfig {
    pub const FIELDS: ServeFields = ServeFields {
        host: FieldPath::new("serve.host"),
        port: FieldPath::new("serve.port"),
        base: FieldPath::new("serve.base"),
        ws_port: FieldPath::new("serve.ws_port"),
    };

    pub fn resolve(&self) -> ResolvedServe {
        ResolvedServe {
            base: normalize_base(&self.base),
            origin: dev_origin(self.host.as_deref(), self.port, self.https),
        }
    }

    /// Like [`resolve`](Self::resolve), with the origin on the port actually bound.
    pub fn resolve_bound(&self, port: u16) -> ResolvedServe {
        ResolvedServe {
            base: normalize_base(&self.base),
            origin: dev_origin(self.host.as_deref(), Some(port), self.https),
        }
    }

    /// Address the HTTP server binds to.
    pub fn bind_host(&self) -> &str {
        match self.host.as_deref() {
            None | Some("") => "127.0.0.1",
            Some(h) => h,
        }
    }

    /// Validate serve configuration.
    ///
    /// # Checks
    /// - the derived origin parses as a URL
    /// - `base` has no query or fragment
    /// - `ws_port` differs from the HTTP port
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let resolved = self.resolve();
        if let Err(e) = url::Url::parse(&resolved.origin) {
            diag.error_with_hint(
                Self::FIELDS.host,
                format!("invalid dev-server origin `{}`: {e}", resolved.origin),
                "use a bare host name or IP address",
            );
        }

        if self.base.contains(['?', '#']) {
            diag.error(
                Self::FIELDS.base,
                format!("{} must be a plain path", Self::FIELDS.base),
            );
        }

        if self.port.unwrap_or(3000) == self.ws_port {
            diag.error_with_hint(
                Self::FIELDS.ws_port,
                format!("{} collides with {}", Self::FIELDS.ws_port, Self::FIELDS.port),
                "pick a different websocket port",
            );
        }
    }
}

/// Field paths of `[serve]` for diagnostics.
pub struct ServeFields {
    pub host: FieldPath,
    pub port: FieldPath,
    pub base: FieldPath,
    pub ws_port: FieldPath,
}
