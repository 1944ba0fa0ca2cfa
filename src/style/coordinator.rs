//! Style coordinator: the single owner of dev-session style state.
//!
//! Sans-io state machine. It never sleeps and never awaits; callers pass
//! the current [`Instant`] in and drive the two singleton timers through
//! [`StyleCoordinator::next_deadline`] / [`StyleCoordinator::poll_timers`].
//! Engine work is handed back as [`ExtractJob`] / [`LoadJob`] values for the
//! caller to run off the owning task.
//!
//! ```text
//! resolve_id ──► registry ◄── begin_load / finish_load
//!                   │
//! transform ──► ExtractJob ──► tokens grew ──► invalidate ──► (debounce) ──► broadcast
//!                                                  ▲
//! ready(url) ── stale served timestamp ────────────┘  (delay 0)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::engine::{Extractor, GenerateResult, Generator};
use super::entry::{EntryRegistry, LAYER_MARK_ALL, resolve_entry};
use super::session::{DevSession, Sessions};
use super::tasks::{PendingTasks, TaskGuard, TaskWaiter, settle_all};
use super::tokens::TokenSet;
use crate::core::now_millis;
use crate::embed::serve::{READY_JS, ReadyVars};
use crate::reload::message::HmrPayload;

/// Readiness callback path (relative to the dev-server base).
pub const READY_PREFIX: &str = "/__unodev_ready";

/// Default quiet period before an invalidation is broadcast.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(10);

/// Default delay before warning about a missing entry import.
pub const DEFAULT_WARN_TIMEOUT: Duration = Duration::from_millis(2000);

pub const ENTRY_NOT_FOUND: &str =
    "entry module not found, have you add `import 'uno.css'` in your main entry?";

/// Marker that a module accepts live updates.
const HOT_MARKER: &str = "import.meta.hot";

/// Session-wide knobs, fixed at config resolution.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub debounce: Duration,
    pub warn_timeout: Duration,
    /// Normalized base path (`""` or `/prefix` without trailing slash).
    pub base: String,
    /// Dev-server origin, e.g. `http://localhost:3000`.
    pub origin: String,
    /// Append the readiness snippet to served entries (serve mode, no SSR).
    pub inject_ready: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            warn_timeout: DEFAULT_WARN_TIMEOUT,
            base: String::new(),
            origin: "http://localhost:3000".into(),
            inject_ready: true,
        }
    }
}

/// Lifecycle of the missing-entry warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningState {
    /// No request observed yet.
    Idle,
    /// Deadline armed on the first request.
    Armed(Instant),
    /// An entry was resolved before the deadline.
    Cancelled,
    /// Warning emitted; terminal.
    Fired,
}

/// Outcome of offering a request to the readiness middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// Not a readiness ping; continue down the chain.
    PassThrough,
    /// Readiness ping answered. `resynced` is true if the client was stale.
    Handled { resynced: bool },
}

/// Which timers fired during [`StyleCoordinator::poll_timers`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub broadcast: bool,
    pub warning: bool,
}

/// Extraction to run off the owning task.
pub struct ExtractJob {
    pub id: String,
    pub code: String,
    tokens: TokenSet,
    extractor: Arc<dyn Extractor>,
    guard: TaskGuard,
}

impl ExtractJob {
    /// Run the extraction. Returns true if the token set grew.
    pub async fn run(self) -> anyhow::Result<bool> {
        let before = self.tokens.len();
        let result = self
            .extractor
            .extract(&self.code, &self.id, &self.tokens)
            .await;
        self.guard.finish();
        result?;
        Ok(self.tokens.len() > before)
    }
}

/// Generation to run off the owning task.
pub struct LoadJob {
    pub id: String,
    pub layer: String,
    waiters: Vec<TaskWaiter>,
    tokens: TokenSet,
    generator: Arc<dyn Generator>,
}

impl LoadJob {
    /// Wait for in-flight extraction, then generate for the full token set.
    pub async fn run(self) -> anyhow::Result<GenerateResult> {
        settle_all(self.waiters).await;
        self.generator.generate(&self.tokens).await
    }
}

/// Owner of registry, tokens, timers and sessions for one dev process.
pub struct StyleCoordinator {
    options: StyleOptions,
    registry: EntryRegistry,
    tokens: TokenSet,
    tasks: PendingTasks,
    sessions: Sessions,
    extractor: Arc<dyn Extractor>,
    generator: Arc<dyn Generator>,
    last_update: u64,
    last_served: u64,
    resolved: bool,
    debounce: Option<Instant>,
    warning: WarningState,
}

impl StyleCoordinator {
    pub fn new(
        options: StyleOptions,
        extractor: Arc<dyn Extractor>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            options,
            registry: EntryRegistry::new(),
            tokens: TokenSet::new(),
            tasks: PendingTasks::new(),
            sessions: Sessions::default(),
            extractor,
            generator,
            last_update: now_millis(),
            last_served: 0,
            resolved: false,
            debounce: None,
            warning: WarningState::Idle,
        }
    }

    pub fn attach(&mut self, session: Arc<dyn DevSession>) {
        self.sessions.attach(session);
        crate::debug!("style"; "session attached (total: {})", self.sessions.len());
    }

    // =========================================================================
    // Entry registry
    // =========================================================================

    /// Resolve a specifier; recognized entries are registered.
    pub fn resolve_id(&mut self, specifier: &str) -> Option<String> {
        let entry = resolve_entry(specifier)?;
        if !self.resolved {
            crate::debug!("style"; "entry resolved: {} ({})", entry.id, entry.layer);
        }
        self.resolved = true;
        if matches!(self.warning, WarningState::Armed(_)) {
            self.warning = WarningState::Cancelled;
        }
        self.registry.insert(&entry);
        Some(entry.id)
    }

    pub fn is_entry(&self, id: &str) -> bool {
        self.registry.contains(id)
    }

    // =========================================================================
    // Extraction trigger
    // =========================================================================

    /// Source-module transform: extract if the filter accepts it.
    pub fn transform(&mut self, code: &str, id: &str) -> Option<ExtractJob> {
        if !self.extractor.filter(code, id) {
            return None;
        }
        Some(self.extract_job(code, id))
    }

    /// HTML document transform: always extract.
    pub fn transform_index_html(&mut self, code: &str, filename: &str) -> ExtractJob {
        self.extract_job(code, filename)
    }

    fn extract_job(&mut self, code: &str, id: &str) -> ExtractJob {
        ExtractJob {
            id: id.to_string(),
            code: code.to_string(),
            tokens: self.tokens.clone(),
            extractor: Arc::clone(&self.extractor),
            guard: self.tasks.register(),
        }
    }

    // =========================================================================
    // Invalidation scheduler + broadcast
    // =========================================================================

    /// Invalidate every entry module now; broadcast after `delay` of quiet.
    pub fn invalidate(&mut self, delay: Duration, now: Instant) {
        let ids = self.registry.ids();
        for session in self.sessions.iter() {
            for id in &ids {
                if let Some(module) = session.module_by_id(id) {
                    session.invalidate_module(&module);
                }
            }
        }
        self.debounce = Some(now + delay);
    }

    /// Invalidate with the configured debounce.
    pub fn invalidate_default(&mut self, now: Instant) {
        self.invalidate(self.options.debounce, now);
    }

    /// Push an update record for every registered entry to every session.
    pub fn broadcast(&mut self) -> u64 {
        self.last_update = self.last_update.max(now_millis());
        let ids = self.registry.ids();
        if ids.is_empty() {
            crate::debug!("style"; "broadcast skipped: no entries");
            return self.last_update;
        }
        let payload = HmrPayload::js_update(ids, self.last_update);
        self.sessions.send_all(&payload);
        crate::debug!("style"; "update sent at {}", self.last_update);
        self.last_update
    }

    // =========================================================================
    // Stylesheet responder
    // =========================================================================

    /// Start a load. `None` declines ids that are not registered entries.
    pub fn begin_load(&self, id: &str) -> Option<LoadJob> {
        let layer = self.registry.layer(id)?;
        Some(LoadJob {
            id: id.to_string(),
            layer: layer.to_string(),
            waiters: self.tasks.snapshot(),
            tokens: self.tokens.clone(),
            generator: Arc::clone(&self.generator),
        })
    }

    /// Complete a load with the generator output.
    pub fn finish_load(&mut self, layer: &str, result: &GenerateResult) -> String {
        self.last_served = self.last_served.max(now_millis());
        if layer == LAYER_MARK_ALL {
            result.layers_except(&self.registry.separate_layers())
        } else {
            result.layer(layer)
        }
    }

    // =========================================================================
    // Readiness handshake
    // =========================================================================

    /// Arm the missing-entry warning on the first request, once.
    pub fn observe_request(&mut self, now: Instant) {
        if !self.resolved && self.warning == WarningState::Idle {
            self.warning = WarningState::Armed(now + self.options.warn_timeout);
        }
    }

    /// Middleware entry point for every incoming request URL.
    pub fn ready(&mut self, url: &str, now: Instant) -> ReadyOutcome {
        self.observe_request(now);

        let base = self.options.base.as_str();
        let path = match url.strip_prefix(base) {
            Some(rest) if !base.is_empty() => rest,
            _ => url,
        };

        let Some(rest) = path.strip_prefix(READY_PREFIX) else {
            return ReadyOutcome::PassThrough;
        };
        let Some(served) = rest.strip_prefix('/').or(rest.is_empty().then_some("")) else {
            return ReadyOutcome::PassThrough;
        };

        let served = served.split('?').next().unwrap_or_default();
        let resynced = match served.parse::<u64>() {
            Ok(served) if served < self.last_update => {
                crate::debug!("style"; "client stale ({} < {}), resync", served, self.last_update);
                self.invalidate(Duration::ZERO, now);
                true
            }
            _ => false,
        };
        ReadyOutcome::Handled { resynced }
    }

    /// Post-transform step: append the readiness snippet to hot entries.
    pub fn post_transform(&self, code: &str, id: &str) -> Option<String> {
        if !self.options.inject_ready || !self.registry.contains(id) || !code.contains(HOT_MARKER) {
            return None;
        }
        let snippet = READY_JS.render(&ReadyVars {
            origin: &self.options.origin,
            base: &self.options.base,
            prefix: READY_PREFIX,
            served: self.last_served,
        });
        Some(format!("{code}\n{snippet}"))
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Earliest armed deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        let warning = match self.warning {
            WarningState::Armed(at) => Some(at),
            _ => None,
        };
        match (self.debounce, warning) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer whose deadline is at or before `now`.
    pub fn poll_timers(&mut self, now: Instant) -> Fired {
        let mut fired = Fired::default();

        if self.debounce.is_some_and(|at| at <= now) {
            self.debounce = None;
            self.broadcast();
            fired.broadcast = true;
        }

        if let WarningState::Armed(at) = self.warning
            && at <= now
        {
            self.warning = WarningState::Fired;
            if !self.resolved {
                self.warn_entry_missing();
                fired.warning = true;
            }
        }

        fired
    }

    fn warn_entry_missing(&self) {
        crate::logger::status_warning(ENTRY_NOT_FOUND);
        self.sessions.send_all(&HmrPayload::error(ENTRY_NOT_FOUND));
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn last_update(&self) -> u64 {
        self.last_update
    }

    pub fn last_served(&self) -> u64 {
        self.last_served
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn warning(&self) -> WarningState {
        self.warning
    }

    pub fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub fn entries(&self) -> &EntryRegistry {
        &self.registry
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.outstanding()
    }

    #[cfg(test)]
    pub(crate) fn set_last_update(&mut self, ts: u64) {
        self.last_update = ts;
    }
}

#[cfg(test)]
mod tests;
