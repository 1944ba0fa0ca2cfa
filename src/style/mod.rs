//! Style coordination for one dev process.
//!
//! # Module Structure
//!
//! - `entry` - Virtual entry grammar and registry
//! - `tokens` - Shared, grow-only token set
//! - `tasks` - In-flight extraction tracking
//! - `engine` - Extractor / Generator contracts
//! - `session` - Dev-server session contract
//! - `coordinator` - The sans-io state machine tying it together

pub mod coordinator;
pub mod engine;
pub mod entry;
pub mod session;
pub mod tasks;
pub mod tokens;

pub use coordinator::{
    ExtractJob, Fired, LoadJob, READY_PREFIX, ReadyOutcome, StyleCoordinator, StyleOptions,
    WarningState,
};
pub use engine::{Extractor, GenerateResult, Generator};
pub use entry::{LAYER_MARK_ALL, VirtualEntry, get_path, resolve_entry};
pub use session::DevSession;
pub use tokens::TokenSet;

use thiserror::Error;

/// Errors surfaced by the style actor to its callers.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The actor has stopped; the dev server is shutting down.
    #[error("style actor is not running")]
    Closed,

    /// The extractor or generator failed.
    #[error("style engine failed: {0:#}")]
    Engine(#[source] anyhow::Error),
}
