//! In-memory module graph for served virtual modules.
//!
//! Caches the transformed code of each served module so repeated requests
//! skip regeneration. Invalidation drops the cached code and bumps the node's
//! generation; the next request recomputes it, and a load that started before
//! the bump cannot cache its result.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::core::now_millis;

/// A module known to the graph.
#[derive(Debug)]
pub struct ModuleNode {
    id: String,
    state: Mutex<NodeState>,
}

#[derive(Debug, Default)]
struct NodeState {
    code: Option<String>,
    generation: u64,
    last_invalidation: u64,
}

impl ModuleNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: Mutex::new(NodeState::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Cached transform result, if still valid.
    pub fn cached(&self) -> Option<String> {
        self.state.lock().code.clone()
    }

    /// Timestamp of the last invalidation (0 = never).
    pub fn last_invalidation(&self) -> u64 {
        self.state.lock().last_invalidation
    }

    /// Bumped on every invalidation.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }
}

/// Module graph shared between the HTTP host and the style coordinator.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    nodes: RwLock<FxHashMap<String, Arc<ModuleNode>>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<ModuleNode>> {
        self.nodes.read().get(id).cloned()
    }

    /// Get or create the node for `id`.
    pub fn ensure(&self, id: &str) -> Arc<ModuleNode> {
        if let Some(node) = self.get(id) {
            return node;
        }
        let mut nodes = self.nodes.write();
        Arc::clone(
            nodes
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(ModuleNode::new(id))),
        )
    }

    /// Cache transformed code for `id`.
    #[cfg(test)]
    pub fn store(&self, id: &str, code: String) {
        self.ensure(id).state.lock().code = Some(code);
    }

    /// Cache `code` for `node` only if it was not invalidated since
    /// `generation` was read. Returns whether the code was stored.
    pub fn store_if_current(&self, node: &ModuleNode, generation: u64, code: String) -> bool {
        let mut state = node.state.lock();
        if state.generation != generation {
            return false;
        }
        state.code = Some(code);
        true
    }

    /// Drop the cached code of `node`.
    pub fn invalidate(&self, node: &ModuleNode) {
        let mut state = node.state.lock();
        state.code = None;
        state.generation += 1;
        state.last_invalidation = now_millis();
        crate::debug!("graph"; "invalidated {}", node.id);
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}
