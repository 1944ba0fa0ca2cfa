//! Live-update message protocol.
//!
//! Defines the JSON payloads pushed over WebSocket to browser clients.
//!
//! # Message Types
//!
//! - `connected`: Handshake acknowledgement
//! - `update`: One or more modules changed, re-fetch them
//! - `error`: Show an error overlay (no reload)

use serde::{Deserialize, Serialize};

/// Payload sent over the live-update transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrPayload {
    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },

    /// Modules changed; the client re-requests each listed path
    Update { updates: Vec<Update> },

    /// Error notice (overlay + console, no reload)
    Error { err: ErrorPayload },
}

/// A single "this module changed" record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub path: String,
    pub accepted_path: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateKind {
    JsUpdate,
    CssUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    pub stack: String,
}

impl HmrPayload {
    /// Create a connected message
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Create an update message re-fetching every id at `timestamp`
    pub fn js_update<I, S>(ids: I, timestamp: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let updates = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                Update {
                    kind: UpdateKind::JsUpdate,
                    accepted_path: id.clone(),
                    path: id,
                    timestamp,
                }
            })
            .collect();
        Self::Update { updates }
    }

    /// Create an error message without a stack
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            err: ErrorPayload {
                message: message.into(),
                stack: String::new(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"connected"}"#.to_string())
    }

    /// Parse from JSON string
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
