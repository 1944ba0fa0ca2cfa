//! Reload Module
//!
//! Live-update plumbing of the built-in dev server.
//!
//! ```text
//! StyleActor ─(HostSession)─► WsActor ─► Browser
//!      │
//!      └─ invalidate ─► ModuleGraph ◄─ HTTP host (cache)
//! ```
//!
//! # Modules
//!
//! - `graph` - Module graph caching served virtual modules
//! - `message` - Live-update payloads (connected, update, error)
//! - `server` - WebSocket listener for client connections
//! - `session` - `DevSession` backed by the graph and the WebSocket actor

pub mod graph;
pub mod message;
pub mod server;
pub mod session;

pub use session::HostSession;
