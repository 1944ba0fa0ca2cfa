//! Shared utility token set.
//!
//! Extraction engines append to it; the generator reads the whole set.
//! There is no removal path: tokens from deleted or edited-away markup stay
//! for the rest of the session.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::RwLock;

/// Append-only set of extracted utility tokens, shared by reference.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    inner: Arc<RwLock<BTreeSet<String>>>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one token. Returns true if it was new.
    pub fn insert(&self, token: impl Into<String>) -> bool {
        self.inner.write().insert(token.into())
    }

    /// Insert many tokens, returning how many were new.
    pub fn extend<I, S>(&self, tokens: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = self.inner.write();
        let before = set.len();
        set.extend(tokens.into_iter().map(Into::into));
        set.len() - before
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.inner.read().contains(token)
    }

    /// Sorted copy of the current tokens.
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_by_reference() {
        let tokens = TokenSet::new();
        let alias = tokens.clone();
        assert!(alias.insert("p-4"));
        assert!(tokens.contains("p-4"));
        assert!(!tokens.insert("p-4"));
    }

    #[test]
    fn test_extend_counts_new_only() {
        let tokens = TokenSet::new();
        assert_eq!(tokens.extend(["m-1", "m-2"]), 2);
        assert_eq!(tokens.extend(["m-2", "m-3"]), 1);
        assert_eq!(tokens.snapshot(), vec!["m-1", "m-2", "m-3"]);
    }
}
