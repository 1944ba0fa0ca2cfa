use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::*;
use crate::actor::StyleHandle;
use crate::engine::SplitExtractor;
use crate::reload::graph::{ModuleGraph, ModuleNode};
use crate::reload::message::HmrPayload;
use crate::style::{
    DevSession, GenerateResult, Generator, ReadyOutcome, StyleOptions, TokenSet,
};

/// `.token{}` per token, in the `default` layer.
struct RuleGenerator {
    fail: bool,
}

#[async_trait]
impl Generator for RuleGenerator {
    async fn generate(&self, tokens: &TokenSet) -> anyhow::Result<GenerateResult> {
        if self.fail {
            anyhow::bail!("generator exploded");
        }
        let rules: Vec<_> = tokens.snapshot().iter().map(|t| format!(".{t}{{}}")).collect();
        Ok(GenerateResult::new().with_layer("default", rules.join("")))
    }
}

#[derive(Default)]
struct RecordingSession {
    graph: ModuleGraph,
    sent: Mutex<Vec<HmrPayload>>,
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

fn spawn_actor(fail: bool) -> StyleHandle {
    let coordinator = StyleCoordinator::new(
        StyleOptions::default(),
        Arc::new(SplitExtractor::new::<&str>(&[], &[]).unwrap()),
        Arc::new(RuleGenerator { fail }),
    );
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(StyleActor::new(rx, coordinator).run());
    StyleHandle::new(tx)
}

#[tokio::test(start_paused = true)]
async fn test_load_reflects_extracted_html() {
    let handle = spawn_actor(false);

    let id = handle.resolve("uno.css").await.unwrap();
    assert_eq!(id.as_deref(), Some("/__uno.css"));

    handle
        .transform_html("/index.html", r#"<div class="p-4 text-red-500">"#.into())
        .await
        .unwrap();

    let css = handle.load("/__uno.css").await.unwrap().unwrap();
    assert!(css.contains(".p-4{}"));
    assert!(css.contains(".text-red-500{}"));
}

#[tokio::test(start_paused = true)]
async fn test_load_declines_unknown_ids() {
    let handle = spawn_actor(false);
    assert_eq!(handle.load("/src/main.ts").await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_generator_failure_surfaces_as_engine_error() {
    let handle = spawn_actor(true);
    handle.resolve("uno.css").await.unwrap();

    let err = handle.load("/__uno.css").await.unwrap_err();
    assert!(matches!(err, StyleError::Engine(_)));
}

#[tokio::test(start_paused = true)]
async fn test_new_tokens_broadcast_after_debounce() {
    let handle = spawn_actor(false);
    let session = Arc::new(RecordingSession::default());
    handle.attach(session.clone()).await.unwrap();
    handle.resolve("uno.css").await.unwrap();

    handle
        .transform("/src/App.vue", r#"<p class="m-2">"#.into())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent = session.sent.lock().clone();
    assert!(matches!(
        sent.as_slice(),
        [HmrPayload::Update { updates }] if updates[0].path == "/__uno.css"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_missing_entry_warning_fires_once() {
    let handle = spawn_actor(false);
    let session = Arc::new(RecordingSession::default());
    handle.attach(session.clone()).await.unwrap();

    let outcome = handle.ready("/index.html").await.unwrap();
    assert_eq!(outcome, ReadyOutcome::PassThrough);
    handle.ready("/main.js").await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let errors: Vec<_> = session.sent.lock().iter().filter(|p| p.is_error()).cloned().collect();
    assert_eq!(errors.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_closed_actor_reports_closed() {
    let handle = spawn_actor(false);
    handle.shutdown().await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert!(matches!(
        handle.resolve("uno.css").await,
        Err(StyleError::Closed)
    ));
}
