//! Embedded client-side resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev client runtime, style module wrapper, readiness snippet
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{CLIENT_JS, ClientVars};
//!
//! let js = CLIENT_JS.render(&ClientVars { ws_port: 24678, base: "" });
//! ```

mod template;

pub use template::{Template, TemplateVars, js_string};

pub mod serve {
    use super::{Template, TemplateVars, js_string};

    /// URL (relative to base) the client runtime is served from.
    pub const CLIENT_PATH: &str = "/@unodev/client.js";

    /// Variables for client.js.
    pub struct ClientVars<'a> {
        pub ws_port: u16,
        pub base: &'a str,
    }

    impl TemplateVars for ClientVars<'_> {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__UNODEV_WS_PORT__", &self.ws_port.to_string())
                .replace("__UNODEV_BASE__", &js_string(self.base))
        }
    }

    /// Browser runtime: WebSocket listener, style injection, error overlay.
    pub const CLIENT_JS: Template<ClientVars<'static>> =
        Template::new(include_str!("serve/client.js"));

    /// Variables for style.js.
    pub struct StyleModuleVars<'a> {
        pub client: &'a str,
        pub id: &'a str,
        pub css: &'a str,
    }

    impl TemplateVars for StyleModuleVars<'_> {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__UNODEV_CLIENT__", &js_string(self.client))
                .replace("__UNODEV_ID__", &js_string(self.id))
                .replace("__UNODEV_CSS__", &js_string(self.css))
        }
    }

    /// JS module wrapping generated CSS for a virtual style entry.
    pub const STYLE_MODULE_JS: Template<StyleModuleVars<'static>> =
        Template::new(include_str!("serve/style.js"));

    /// Variables for ready.js.
    pub struct ReadyVars<'a> {
        pub origin: &'a str,
        pub base: &'a str,
        pub prefix: &'a str,
        pub served: u64,
    }

    impl TemplateVars for ReadyVars<'_> {
        fn apply(&self, content: &str) -> String {
            let path = format!("{}{}/{}", self.base, self.prefix, self.served);
            content
                .replace("__UNODEV_ORIGIN__", &js_string(self.origin))
                .replace("__UNODEV_REMOTE_URL__", &js_string(&format!("{}{}", self.origin, path)))
                .replace("__UNODEV_LOCAL_URL__", &js_string(&path))
        }
    }

    /// Readiness ping appended to hot style entries.
    pub const READY_JS: Template<ReadyVars<'static>> =
        Template::new(include_str!("serve/ready.js"));

    /// `<script>` tag loading the client runtime.
    pub fn client_tag(base: &str) -> String {
        format!(r#"<script type="module" src="{base}{CLIENT_PATH}"></script>"#)
    }
}
