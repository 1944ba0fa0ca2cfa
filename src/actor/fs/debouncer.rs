use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

/// Quiet period before a batch of changed paths is released.
pub(super) const DEBOUNCE_MS: u64 = 50;

/// Pure debouncer: only handles timing and path deduplication.
pub(super) struct Debouncer {
    /// Paths whose current content should be extracted
    pub(super) changes: FxHashSet<PathBuf>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashSet::default(),
            last_event: None,
        }
    }

    /// Add a notify event.
    ///
    /// Creates and content modifications mark a path changed; a removal
    /// drops it again. Metadata-only changes are ignored.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let removed = match event.kind {
            EventKind::Create(_) => false,
            EventKind::Remove(_) => true,
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => false,
            _ => return,
        };

        crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            if removed {
                self.changes.remove(path);
            } else {
                self.changes.insert(path.clone());
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the changed paths once the quiet period has elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let mut paths: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        paths.sort();
        Some(paths)
    }

    pub(super) fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        last_event.elapsed() >= Duration::from_millis(DEBOUNCE_MS) && !self.changes.is_empty()
    }

    /// Precise sleep duration until next possible ready time.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return Duration::from_secs(86400);
        };
        Duration::from_millis(DEBOUNCE_MS)
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}
