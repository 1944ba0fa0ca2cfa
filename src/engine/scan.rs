//! Source discovery for extraction.
//!
//! Walks the project root once (initial dev scan, one-shot build) and reads
//! candidate files in parallel.

use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rayon::prelude::*;

use crate::config::STATE_DIR;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &["node_modules", ".git", STATE_DIR, "target"];

/// A source file ready for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Module id (the file path as a string).
    pub id: String,
    pub code: String,
}

impl Source {
    pub fn is_html(&self) -> bool {
        is_html(Path::new(&self.id))
    }
}

pub fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// Collect files under `root` that are HTML or accepted by `accept`.
pub fn collect_sources(root: &Path, accept: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    WalkDir::new(root)
        .skip_hidden(false)
        .process_read_dir(|_, _, _, children| {
            children.retain(|entry| {
                entry.as_ref().map_or(true, |e| {
                    !(e.file_type().is_dir()
                        && SKIP_DIRS.contains(&e.file_name().to_str().unwrap_or_default()))
                })
            });
        })
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|path| is_html(path) || accept(&path.to_string_lossy()))
        .collect()
}

/// Read `files` in parallel. Unreadable or non-UTF-8 files are skipped.
pub fn read_sources(files: &[PathBuf]) -> Vec<Source> {
    files
        .par_iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(code) => Some(Source {
                id: path.to_string_lossy().into_owned(),
                code,
            }),
            Err(e) => {
                crate::debug!("scan"; "skip {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}
