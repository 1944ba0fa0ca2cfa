//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! HTTP host ─┐
//!            ├─StyleMsg─► StyleActor ──(DevSession)──WsMsg──► WsActor ──► Clients
//! FsActor ───┘
//! ```

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::reload::message::HmrPayload;
use crate::style::{DevSession, GenerateResult, ReadyOutcome, StyleError};

/// Reply slot for request/response messages.
pub type Reply<T> = oneshot::Sender<T>;

// =============================================================================
// StyleActor Messages
// =============================================================================

/// Messages to Style Actor
pub enum StyleMsg {
    /// Resolve a module specifier; registers recognized entries
    Resolve {
        specifier: String,
        reply: Reply<Option<String>>,
    },
    /// Source module changed or was requested
    Transform { id: String, code: String },
    /// HTML document served
    TransformHtml { filename: String, code: String },
    /// Load a virtual entry's CSS (`None` for non-entries)
    Load {
        id: String,
        reply: Reply<Result<Option<String>, StyleError>>,
    },
    /// Append the readiness snippet to a served entry module
    PostTransform {
        id: String,
        code: String,
        reply: Reply<Option<String>>,
    },
    /// Offer a request URL to the readiness middleware
    Ready {
        url: String,
        reply: Reply<ReadyOutcome>,
    },
    /// Invalidate entries (`None` = configured debounce)
    Invalidate { delay: Option<Duration> },
    /// Register a dev-server session
    Attach(Arc<dyn DevSession>),
    /// Shutdown
    Shutdown,
}

/// Completions of work the style actor spawned.
pub(crate) enum JobDone {
    Extracted {
        id: String,
        result: anyhow::Result<bool>,
    },
    Loaded {
        id: String,
        layer: String,
        result: anyhow::Result<GenerateResult>,
        reply: Reply<Result<Option<String>, StyleError>>,
    },
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Send a payload to every client
    Send(HmrPayload),
    /// Add client
    AddClient(TcpStream),
    /// Shutdown
    Shutdown,
}
