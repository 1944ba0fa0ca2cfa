//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use crate::config::STATE_DIR;

/// Resolve a decoded request path under `root`, mapping directories to
/// their `index.html`.
///
/// Rejects traversal (also via symlinks) and the generator's state dir.
pub fn resolve_path(path: &str, root: &Path) -> Option<PathBuf> {
    let clean = path.trim_matches('/');
    if clean.contains("..") || clean.split('/').next() == Some(STATE_DIR) {
        return None;
    }

    let canonical = root.join(clean).canonicalize().ok()?;
    let root_canonical = root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}
