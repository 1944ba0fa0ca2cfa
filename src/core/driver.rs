//! Run mode for the style pipeline.

/// How the stylesheet is consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Dev server: live updates, readiness handshake.
    #[default]
    Serve,
    /// One-shot generation to a file.
    Build,
}

impl BuildMode {
    #[inline]
    pub const fn is_serve(self) -> bool {
        matches!(self, Self::Serve)
    }

    /// Whether served style entries get the readiness snippet.
    ///
    /// Server-rendered pages evaluate entries outside the browser, where the
    /// snippet's `document` lookup would fail.
    #[inline]
    pub const fn inject_ready(self, ssr: bool) -> bool {
        self.is_serve() && !ssr
    }
}
