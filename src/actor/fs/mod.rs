//! FileSystem Actor
//!
//! Watches the project root and feeds changed sources to the style actor.
//! The watcher starts before the initial scan so no edit is lost in between.
//!
//! ```text
//! notify → Debouncer (timing + dedup) → read file → StyleHandle::transform{,_html}
//! ```

mod debouncer;


use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use super::StyleHandle;
use crate::engine::is_html;
use crate::style::StyleError;
use debouncer::Debouncer;

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: RecommendedWatcher,
    /// Directory the generator writes into; never extracted
    state_dir: PathBuf,
    style: StyleHandle,
}

impl FsActor {
    /// Start watching `root` recursively. Events buffer until [`Self::run`].
    pub fn new(root: &Path, state_dir: PathBuf, style: StyleHandle) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        crate::debug!("watch"; "watching {}", root.display());

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            state_dir,
            style,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let mut debouncer = Debouncer::new();

        let (async_tx, mut async_rx) = tokio::sync::mpsc::channel::<notify::Event>(64);

        // notify is sync; bridge it on a plain thread
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(paths) = debouncer.take_if_ready() else {
                        continue;
                    };
                    if dispatch(&paths, &self.state_dir, &self.style).await.is_err() {
                        break;
                    }
                }
            }
        }
        crate::debug!("watch"; "stopped");
    }
}

/// Read each changed file and hand it to the style actor.
///
/// Returns `Err` once the style actor is gone.
async fn dispatch(paths: &[PathBuf], state_dir: &Path, style: &StyleHandle) -> Result<(), StyleError> {
    for path in paths {
        if path.starts_with(state_dir) {
            continue;
        }
        let code = match tokio::fs::read_to_string(path).await {
            Ok(code) => code,
            Err(e) => {
                crate::debug!("watch"; "skip {}: {}", path.display(), e);
                continue;
            }
        };

        let id = path.to_string_lossy();
        crate::debug!("watch"; "changed {}", id);
        if is_html(path) {
            style.transform_html(&id, code).await?;
        } else {
            style.transform(&id, code).await?;
        }
    }
    Ok(())
}
