//! Dev-server session contract.
//!
//! A session bundles the two host collaborators the coordinator fans out to:
//! the module graph (lookup + invalidation) and the live-update transport.

use std::sync::Arc;

use crate::reload::graph::ModuleNode;
use crate::reload::message::HmrPayload;

/// One connected dev server instance.
pub trait DevSession: Send + Sync {
    /// Module graph node for `id`, if the host has seen it.
    fn module_by_id(&self, id: &str) -> Option<Arc<ModuleNode>>;

    /// Mark a cached module stale.
    fn invalidate_module(&self, module: &ModuleNode);

    /// Push a payload to every client of this session.
    fn send(&self, payload: HmrPayload);
}

/// Set of sessions, treated as one for fan-out.
#[derive(Default)]
pub struct Sessions {
    sessions: Vec<Arc<dyn DevSession>>,
}

impl Sessions {
    pub fn attach(&mut self, session: Arc<dyn DevSession>) {
        if !self.sessions.iter().any(|s| Arc::ptr_eq(s, &session)) {
            self.sessions.push(session);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DevSession>> {
        self.sessions.iter()
    }

    pub fn send_all(&self, payload: &HmrPayload) {
        for session in &self.sessions {
            session.send(payload.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
