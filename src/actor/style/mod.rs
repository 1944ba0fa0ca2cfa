//! Style Actor - Single Writer of Style State
//!
//! Owns the [`StyleCoordinator`] and serializes every mutation through one
//! task. Engine work runs on spawned tasks and reports back on an internal
//! completion channel, so the loop never blocks on extraction or generation.
//!
//! ```text
//! StyleMsg ──────┐
//! JobDone ───────┼──► select! ──► StyleCoordinator
//! next_deadline ─┘                   │
//!                                    └──► ExtractJob / LoadJob ──► tokio::spawn ──► JobDone
//! ```

use tokio::sync::mpsc;
use tokio::time::Instant;

use super::messages::{JobDone, StyleMsg};
use crate::logger::{status_error, status_success, status_unchanged};
use crate::style::{ExtractJob, StyleCoordinator, StyleError};

#[cfg(test)]
mod tests;

/// Style Actor - drives the coordinator and its timers
pub struct StyleActor {
    rx: mpsc::Receiver<StyleMsg>,
    done_tx: mpsc::UnboundedSender<JobDone>,
    done_rx: mpsc::UnboundedReceiver<JobDone>,
    coordinator: StyleCoordinator,
}

impl StyleActor {
    pub fn new(rx: mpsc::Receiver<StyleMsg>, coordinator: StyleCoordinator) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            rx,
            done_tx,
            done_rx,
            coordinator,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        loop {
            let deadline = self.coordinator.next_deadline();
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(StyleMsg::Shutdown) | None => {
                        crate::debug!("style"; "shutting down");
                        break;
                    }
                    Some(msg) => self.handle(msg),
                },
                Some(done) = self.done_rx.recv() => self.complete(done),
                _ = wait_until(deadline) => self.fire_timers(),
            }
        }
    }

    fn handle(&mut self, msg: StyleMsg) {
        let now = Instant::now();
        match msg {
            StyleMsg::Resolve { specifier, reply } => {
                let _ = reply.send(self.coordinator.resolve_id(&specifier));
            }

            StyleMsg::Transform { id, code } => {
                if let Some(job) = self.coordinator.transform(&code, &id) {
                    self.spawn_extract(job);
                }
            }

            StyleMsg::TransformHtml { filename, code } => {
                let job = self.coordinator.transform_index_html(&code, &filename);
                self.spawn_extract(job);
            }

            StyleMsg::Load { id, reply } => {
                let Some(job) = self.coordinator.begin_load(&id) else {
                    let _ = reply.send(Ok(None));
                    return;
                };
                let done = self.done_tx.clone();
                tokio::spawn(async move {
                    let id = job.id.clone();
                    let layer = job.layer.clone();
                    let result = job.run().await;
                    let _ = done.send(JobDone::Loaded {
                        id,
                        layer,
                        result,
                        reply,
                    });
                });
            }

            StyleMsg::PostTransform { id, code, reply } => {
                let _ = reply.send(self.coordinator.post_transform(&code, &id));
            }

            StyleMsg::Ready { url, reply } => {
                let _ = reply.send(self.coordinator.ready(&url, now));
            }

            StyleMsg::Invalidate { delay } => match delay {
                Some(delay) => self.coordinator.invalidate(delay, now),
                None => self.coordinator.invalidate_default(now),
            },

            StyleMsg::Attach(session) => self.coordinator.attach(session),

            // Handled by the loop
            StyleMsg::Shutdown => {}
        }
    }

    fn spawn_extract(&self, job: ExtractJob) {
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let id = job.id.clone();
            let result = job.run().await;
            let _ = done.send(JobDone::Extracted { id, result });
        });
    }

    fn complete(&mut self, done: JobDone) {
        match done {
            JobDone::Extracted { id, result } => match result {
                Ok(true) => {
                    crate::debug!("style"; "new tokens from {} ({} total)", id, self.coordinator.tokens().len());
                    self.coordinator.invalidate_default(Instant::now());
                }
                Ok(false) => {}
                Err(e) => status_error(&format!("extract failed: {id}"), &format!("{e:#}")),
            },

            JobDone::Loaded {
                id,
                layer,
                result,
                reply,
            } => {
                let outcome = match result {
                    Ok(generated) => Ok(Some(self.coordinator.finish_load(&layer, &generated))),
                    Err(e) => {
                        status_error(&format!("generate failed: {id}"), &format!("{e:#}"));
                        Err(StyleError::Engine(e))
                    }
                };
                let _ = reply.send(outcome);
            }
        }
    }

    fn fire_timers(&mut self) {
        let fired = self.coordinator.poll_timers(Instant::now());
        if !fired.broadcast {
            return;
        }
        let tokens = self.coordinator.tokens().len();
        if self.coordinator.entries().is_empty() {
            status_unchanged(&format!("tokens: {tokens} (no style entry imported yet)"));
        } else {
            status_success(&format!("css updated ({tokens} tokens)"));
        }
    }
}

/// Sleep until `deadline`, or forever when no timer is armed.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
