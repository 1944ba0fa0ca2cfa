use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use super::*;
use crate::reload::graph::{ModuleGraph, ModuleNode};
use crate::style::entry::LAYER_MARK_ALL;

// =============================================================================
// Test doubles
// =============================================================================

/// Splits on whitespace; optionally waits on a gate before inserting.
struct WordExtractor {
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl Extractor for WordExtractor {
    fn filter(&self, _code: &str, id: &str) -> bool {
        !id.contains("node_modules")
    }

    async fn extract(&self, code: &str, _id: &str, tokens: &TokenSet) -> anyhow::Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        tokens.extend(code.split_whitespace());
        Ok(())
    }
}

/// Emits `.token{}` per token into `default`, plus a fixed preflight layer.
struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, tokens: &TokenSet) -> anyhow::Result<GenerateResult> {
        let rules: Vec<_> = tokens.snapshot().iter().map(|t| format!(".{t}{{}}")).collect();
        Ok(GenerateResult::new()
            .with_layer("preflights", "*{margin:0}")
            .with_layer("default", rules.join(""))
            .with_layer("icons", ".i{}"))
    }
}

#[derive(Default)]
struct RecordingSession {
    graph: ModuleGraph,
    sent: Mutex<Vec<HmrPayload>>,
}

impl RecordingSession {
    fn updates(&self) -> Vec<HmrPayload> {
        self.sent
            .lock()
            .iter()
            .filter(|p| matches!(p, HmrPayload::Update { .. }))
            .cloned()
            .collect()
    }

    fn errors(&self) -> Vec<HmrPayload> {
        self.sent.lock().iter().filter(|p| p.is_error()).cloned().collect()
    }
}

impl DevSession for RecordingSession {
    fn module_by_id(&self, id: &str) -> Option<Arc<ModuleNode>> {
        self.graph.get(id)
    }

    fn invalidate_module(&self, module: &ModuleNode) {
        self.graph.invalidate(module);
    }

    fn send(&self, payload: HmrPayload) {
        self.sent.lock().push(payload);
    }
}

fn coordinator_with(options: StyleOptions, gate: Option<Arc<Notify>>) -> StyleCoordinator {
    StyleCoordinator::new(
        options,
        Arc::new(WordExtractor { gate }),
        Arc::new(EchoGenerator),
    )
}

fn setup() -> (StyleCoordinator, Arc<RecordingSession>) {
    let mut coord = coordinator_with(StyleOptions::default(), None);
    let session = Arc::new(RecordingSession::default());
    coord.attach(session.clone());
    (coord, session)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// =============================================================================
// Invalidation scheduler
// =============================================================================

#[test]
fn test_debounce_coalesces_burst() {
    let (mut coord, session) = setup();
    coord.resolve_id("uno.css");
    let t0 = Instant::now();

    coord.invalidate(ms(10), t0);
    coord.invalidate(ms(10), t0 + ms(5));
    coord.invalidate(ms(10), t0 + ms(8));

    assert_eq!(coord.next_deadline(), Some(t0 + ms(18)));
    assert!(!coord.poll_timers(t0 + ms(17)).broadcast);
    assert!(session.updates().is_empty());

    assert!(coord.poll_timers(t0 + ms(18)).broadcast);
    assert!(!coord.poll_timers(t0 + ms(100)).broadcast);
    assert_eq!(session.updates().len(), 1);
    assert!(coord.next_deadline().is_none());
}

#[test]
fn test_continuous_stream_never_fires() {
    let (mut coord, session) = setup();
    coord.resolve_id("uno.css");
    let t0 = Instant::now();

    for step in 0..50 {
        let now = t0 + ms(step * 9);
        coord.poll_timers(now);
        coord.invalidate(ms(10), now);
    }
    assert!(session.updates().is_empty());

    coord.poll_timers(t0 + ms(49 * 9 + 10));
    assert_eq!(session.updates().len(), 1);
}

#[test]
fn test_invalidate_marks_graph_before_broadcast() {
    let (mut coord, session) = setup();
    let id = coord.resolve_id("uno:default.css").unwrap();
    session.graph.store(&id, "cached".into());
    session.graph.store("/main.js", "other".into());

    coord.invalidate(ms(10), Instant::now());

    assert!(session.graph.get(&id).unwrap().cached().is_none());
    assert!(session.graph.get("/main.js").unwrap().cached().is_some());
    assert!(session.updates().is_empty());
}

#[test]
fn test_invalidate_fans_out_to_every_session() {
    let (mut coord, first) = setup();
    let second = Arc::new(RecordingSession::default());
    coord.attach(second.clone());
    let id = coord.resolve_id("uno.css").unwrap();
    first.graph.store(&id, "a".into());
    second.graph.store(&id, "b".into());

    let t0 = Instant::now();
    coord.invalidate(Duration::ZERO, t0);
    coord.poll_timers(t0);

    for session in [&first, &second] {
        assert!(session.graph.get(&id).unwrap().cached().is_none());
        assert_eq!(session.updates().len(), 1);
    }
}

// =============================================================================
// Broadcast
// =============================================================================

#[test]
fn test_broadcast_lists_current_entries() {
    let (mut coord, session) = setup();
    coord.resolve_id("uno.css");
    let t0 = Instant::now();
    coord.invalidate(ms(10), t0);
    // Registered after arming: still part of the payload.
    coord.resolve_id("uno:icons.css");
    coord.poll_timers(t0 + ms(10));

    let HmrPayload::Update { updates } = &session.updates()[0] else {
        panic!("Expected Update payload");
    };
    let paths: Vec<_> = updates.iter().map(|u| u.path.as_str()).collect();
    assert_eq!(paths, vec!["/__uno.css", "/__uno_icons.css"]);
    assert!(updates.iter().all(|u| u.accepted_path == u.path));
    assert!(updates.iter().all(|u| u.timestamp == coord.last_update()));
}

#[test]
fn test_broadcast_timestamps_monotonic() {
    let (mut coord, _session) = setup();
    coord.resolve_id("uno.css");

    let mut previous = coord.last_update();
    for _ in 0..5 {
        let ts = coord.broadcast();
        assert!(ts >= previous);
        previous = ts;
    }

    // A clock that appears to go backwards never lowers the timestamp.
    let future = now_millis() + 60_000;
    coord.set_last_update(future);
    assert_eq!(coord.broadcast(), future);
    assert_eq!(coord.last_update(), future);
}

// =============================================================================
// Entry registry
// =============================================================================

#[test]
fn test_unknown_ids_are_declined() {
    let (mut coord, _session) = setup();
    for spec in ["", "main.ts", "uno.scss", "virtual:other.css", "/__uno.js"] {
        assert!(coord.resolve_id(spec).is_none());
        assert!(coord.begin_load(spec).is_none());
    }
    assert!(coord.entries().is_empty());
    assert!(!coord.is_resolved());
}

#[test]
fn test_resolve_is_idempotent() {
    let (mut coord, _session) = setup();
    assert_eq!(coord.resolve_id("uno.css").as_deref(), Some("/__uno.css"));
    assert_eq!(coord.resolve_id("uno.css").as_deref(), Some("/__uno.css"));
    assert_eq!(coord.entries().len(), 1);
    assert!(coord.is_entry("/__uno.css?t=1"));
}

// =============================================================================
// Stylesheet responder
// =============================================================================

#[tokio::test]
async fn test_read_after_write() {
    let (mut coord, _session) = setup();
    let id = coord.resolve_id("uno:default.css").unwrap();

    let job = coord.transform("flex p-4", "/src/App.vue").unwrap();
    assert!(job.run().await.unwrap());

    let load = coord.begin_load(&id).unwrap();
    let layer = load.layer.clone();
    let result = load.run().await.unwrap();
    let css = coord.finish_load(&layer, &result);

    assert_eq!(css, ".flex{}.p-4{}");
    assert!(coord.last_served() > 0);
}

#[tokio::test]
async fn test_load_waits_for_inflight_extraction() {
    let gate = Arc::new(Notify::new());
    let mut coord = coordinator_with(StyleOptions::default(), Some(gate.clone()));
    let id = coord.resolve_id("uno:default.css").unwrap();

    let extract = tokio::spawn(coord.transform("grid", "/src/a.vue").unwrap().run());
    let load = tokio::spawn(coord.begin_load(&id).unwrap().run());

    tokio::task::yield_now().await;
    assert!(!load.is_finished());
    assert_eq!(coord.pending_tasks(), 1);

    gate.notify_one();
    extract.await.unwrap().unwrap();
    let result = load.await.unwrap().unwrap();
    assert_eq!(coord.finish_load("default", &result), ".grid{}");
    assert_eq!(coord.pending_tasks(), 0);
}

#[tokio::test]
async fn test_load_ignores_extraction_started_later() {
    let gate = Arc::new(Notify::new());
    let mut coord = coordinator_with(StyleOptions::default(), Some(gate.clone()));
    let id = coord.resolve_id("uno:default.css").unwrap();

    let load = coord.begin_load(&id).unwrap();
    let _late = tokio::spawn(coord.transform("late", "/src/b.vue").unwrap().run());

    let result = load.run().await.unwrap();
    assert_eq!(coord.finish_load("default", &result), "");
}

#[test]
fn test_filter_gates_source_transform_not_html() {
    let (mut coord, _session) = setup();
    assert!(coord.transform("x", "/node_modules/lib/index.js").is_none());
    assert_eq!(coord.pending_tasks(), 0);

    let _job = coord.transform_index_html("x", "/node_modules/index.html");
    assert_eq!(coord.pending_tasks(), 1);
}

#[tokio::test]
async fn test_extract_reports_growth() {
    let (mut coord, _session) = setup();
    assert!(coord.transform("a b", "/a.vue").unwrap().run().await.unwrap());
    assert!(!coord.transform("b a", "/b.vue").unwrap().run().await.unwrap());
    assert_eq!(coord.tokens().len(), 2);
}

#[tokio::test]
async fn test_all_layers_entry_alone_carries_everything() {
    let (mut coord, _session) = setup();
    let all = coord.resolve_id("uno.css").unwrap();
    coord.transform("m-1", "/a.vue").unwrap().run().await.unwrap();

    let load = coord.begin_load(&all).unwrap();
    assert_eq!(load.layer, LAYER_MARK_ALL);
    let result = load.run().await.unwrap();
    let css = coord.finish_load(LAYER_MARK_ALL, &result);

    assert_eq!(css, "*{margin:0}\n.m-1{}\n.i{}");
}

#[tokio::test]
async fn test_all_layers_entry_skips_separately_imported_layers() {
    let (mut coord, _session) = setup();
    let default = coord.resolve_id("uno:default.css").unwrap();
    let all = coord.resolve_id("uno.css").unwrap();
    coord.transform("m-1", "/a.vue").unwrap().run().await.unwrap();

    let load = coord.begin_load(&all).unwrap();
    let result = load.run().await.unwrap();
    let all_css = coord.finish_load(LAYER_MARK_ALL, &result);

    let load = coord.begin_load(&default).unwrap();
    let layer = load.layer.clone();
    let result = load.run().await.unwrap();
    let default_css = coord.finish_load(&layer, &result);

    // Importing both entries delivers each rule once.
    assert_eq!(default_css, ".m-1{}");
    assert_eq!(all_css, "*{margin:0}\n.i{}");
    assert!(!all_css.contains(".m-1{}"));
}

// =============================================================================
// Readiness handshake
// =============================================================================

#[test]
fn test_stale_ready_ping_forces_immediate_broadcast() {
    let (mut coord, session) = setup();
    coord.resolve_id("uno.css");
    coord.set_last_update(150);
    let now = Instant::now();

    let outcome = coord.ready("/__unodev_ready/100", now);
    assert_eq!(outcome, ReadyOutcome::Handled { resynced: true });
    assert_eq!(coord.next_deadline(), Some(now));

    assert!(coord.poll_timers(now).broadcast);
    let HmrPayload::Update { updates } = &session.updates()[0] else {
        panic!("Expected Update payload");
    };
    assert!(updates[0].timestamp > 150);
}

#[test]
fn test_fresh_ready_ping_is_answered_quietly() {
    let (mut coord, session) = setup();
    coord.resolve_id("uno.css");
    let served = coord.last_update() + 1;

    let outcome = coord.ready(&format!("/__unodev_ready/{served}"), Instant::now());
    assert_eq!(outcome, ReadyOutcome::Handled { resynced: false });
    assert!(coord.next_deadline().is_none());
    assert!(session.updates().is_empty());
}

#[test]
fn test_ready_ping_under_base() {
    let options = StyleOptions {
        base: "/app".into(),
        ..StyleOptions::default()
    };
    let mut coord = coordinator_with(options, None);
    coord.set_last_update(10);

    assert_eq!(
        coord.ready("/app/__unodev_ready/5", Instant::now()),
        ReadyOutcome::Handled { resynced: true }
    );
    assert_eq!(
        coord.ready("/app/index.html", Instant::now()),
        ReadyOutcome::PassThrough
    );
}

#[test]
fn test_ready_pass_through_and_garbage() {
    let (mut coord, _session) = setup();
    let now = Instant::now();
    assert_eq!(coord.ready("/index.html", now), ReadyOutcome::PassThrough);
    assert_eq!(coord.ready("/__unodev_readyz/1", now), ReadyOutcome::PassThrough);
    assert_eq!(
        coord.ready("/__unodev_ready/not-a-number", now),
        ReadyOutcome::Handled { resynced: false }
    );
    assert_eq!(
        coord.ready("/__unodev_ready", now),
        ReadyOutcome::Handled { resynced: false }
    );
}

#[test]
fn test_warning_fires_once_without_entry() {
    let (mut coord, session) = setup();
    let t0 = Instant::now();

    coord.observe_request(t0);
    coord.observe_request(t0 + ms(500));
    assert_eq!(coord.warning(), WarningState::Armed(t0 + ms(2000)));

    assert!(!coord.poll_timers(t0 + ms(1999)).warning);
    assert!(coord.poll_timers(t0 + ms(2000)).warning);
    assert_eq!(coord.warning(), WarningState::Fired);
    assert!(!coord.poll_timers(t0 + ms(9000)).warning);

    let errors = session.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], HmrPayload::error(ENTRY_NOT_FOUND));

    // Terminal: a later resolution does not re-arm anything.
    coord.resolve_id("uno.css");
    coord.observe_request(t0 + ms(9001));
    assert_eq!(coord.warning(), WarningState::Fired);
}

#[test]
fn test_warning_cancelled_by_resolution() {
    // resolve before the first request
    let (mut coord, session) = setup();
    let t0 = Instant::now();
    coord.resolve_id("uno.css");
    coord.observe_request(t0);
    assert_eq!(coord.warning(), WarningState::Idle);
    assert!(!coord.poll_timers(t0 + ms(5000)).warning);
    assert!(session.errors().is_empty());

    // request, then resolve just before the deadline
    let (mut coord, session) = setup();
    coord.observe_request(t0);
    coord.resolve_id("virtual:uno:default.css");
    assert_eq!(coord.warning(), WarningState::Cancelled);
    assert!(coord.next_deadline().is_none());
    assert!(!coord.poll_timers(t0 + ms(2000)).warning);
    assert!(session.errors().is_empty());
}

#[test]
fn test_post_transform_appends_ready_snippet() {
    let options = StyleOptions {
        base: "/app".into(),
        origin: "http://localhost:5173".into(),
        ..StyleOptions::default()
    };
    let mut coord = coordinator_with(options, None);
    let id = coord.resolve_id("uno.css").unwrap();
    let code = "import.meta.hot.accept()";

    let out = coord.post_transform(code, &format!("{id}?t=1")).unwrap();
    assert!(out.starts_with(code));
    assert!(out.contains(r#""http://localhost:5173""#));
    assert!(out.contains(r#""http://localhost:5173/app/__unodev_ready/0""#));
    assert!(out.contains(r#""/app/__unodev_ready/0""#));
    assert!(out.contains("no-cors"));

    assert!(coord.post_transform("export {}", &id).is_none());
    assert!(coord.post_transform(code, "/main.js").is_none());
}

#[test]
fn test_post_transform_disabled_for_ssr() {
    let options = StyleOptions {
        inject_ready: false,
        ..StyleOptions::default()
    };
    let mut coord = coordinator_with(options, None);
    let id = coord.resolve_id("uno.css").unwrap();
    assert!(coord.post_transform("import.meta.hot", &id).is_none());
}
