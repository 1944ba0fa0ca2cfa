//! Actor System for the Dev Server
//!
//! Message-passing concurrency for serve mode:
//!
//! ```text
//! FsActor ──┐
//!           ├──► StyleActor ──(HostSession)──► WsActor ──► Browser
//! HTTP host ┘   (coordinator)                 (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `style` - Single owner of the style coordinator
//! - `handle` - Typed sender for the style actor
//! - `fs` - File system watcher with debouncing
//! - `ws` - WebSocket broadcast
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod handle;
pub mod messages;
pub mod style;
pub mod ws;

pub use coordinator::{ActorSystem, Coordinator, DevContext};
pub use handle::StyleHandle;
