//! Typed front door to the style actor.
//!
//! Async methods are for tasks on the actor runtime; the `blocking_*`
//! variants are for HTTP worker threads outside it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::messages::StyleMsg;
use crate::style::{DevSession, ReadyOutcome, StyleError};

/// Cloneable sender side of the style actor.
#[derive(Clone)]
pub struct StyleHandle {
    tx: mpsc::Sender<StyleMsg>,
}

impl StyleHandle {
    pub fn new(tx: mpsc::Sender<StyleMsg>) -> Self {
        Self { tx }
    }

    async fn send(&self, msg: StyleMsg) -> Result<(), StyleError> {
        self.tx.send(msg).await.map_err(|_| StyleError::Closed)
    }

    fn blocking_send(&self, msg: StyleMsg) -> Result<(), StyleError> {
        self.tx.blocking_send(msg).map_err(|_| StyleError::Closed)
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> StyleMsg) -> Result<T, StyleError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| StyleError::Closed)
    }

    fn blocking_ask<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> StyleMsg,
    ) -> Result<T, StyleError> {
        let (reply, rx) = oneshot::channel();
        self.blocking_send(make(reply))?;
        rx.blocking_recv().map_err(|_| StyleError::Closed)
    }

    // =========================================================================
    // Async API
    // =========================================================================

    pub async fn resolve(&self, specifier: &str) -> Result<Option<String>, StyleError> {
        let specifier = specifier.to_string();
        self.ask(|reply| StyleMsg::Resolve { specifier, reply }).await
    }

    pub async fn transform(&self, id: &str, code: String) -> Result<(), StyleError> {
        self.send(StyleMsg::Transform {
            id: id.to_string(),
            code,
        })
        .await
    }

    pub async fn transform_html(&self, filename: &str, code: String) -> Result<(), StyleError> {
        self.send(StyleMsg::TransformHtml {
            filename: filename.to_string(),
            code,
        })
        .await
    }

    pub async fn load(&self, id: &str) -> Result<Option<String>, StyleError> {
        let id = id.to_string();
        self.ask(|reply| StyleMsg::Load { id, reply }).await?
    }

    pub async fn post_transform(&self, id: &str, code: String) -> Result<Option<String>, StyleError> {
        let id = id.to_string();
        self.ask(|reply| StyleMsg::PostTransform { id, code, reply })
            .await
    }

    pub async fn ready(&self, url: &str) -> Result<ReadyOutcome, StyleError> {
        let url = url.to_string();
        self.ask(|reply| StyleMsg::Ready { url, reply }).await
    }

    pub async fn invalidate(&self, delay: Option<Duration>) -> Result<(), StyleError> {
        self.send(StyleMsg::Invalidate { delay }).await
    }

    pub async fn attach(&self, session: Arc<dyn DevSession>) -> Result<(), StyleError> {
        self.send(StyleMsg::Attach(session)).await
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(StyleMsg::Shutdown).await;
    }

    // =========================================================================
    // Blocking API (HTTP worker threads)
    // =========================================================================

    pub fn blocking_resolve(&self, specifier: &str) -> Result<Option<String>, StyleError> {
        let specifier = specifier.to_string();
        self.blocking_ask(|reply| StyleMsg::Resolve { specifier, reply })
    }

    pub fn blocking_transform(&self, id: &str, code: String) -> Result<(), StyleError> {
        self.blocking_send(StyleMsg::Transform {
            id: id.to_string(),
            code,
        })
    }

    pub fn blocking_transform_html(&self, filename: &str, code: String) -> Result<(), StyleError> {
        self.blocking_send(StyleMsg::TransformHtml {
            filename: filename.to_string(),
            code,
        })
    }

    pub fn blocking_load(&self, id: &str) -> Result<Option<String>, StyleError> {
        let id = id.to_string();
        self.blocking_ask(|reply| StyleMsg::Load { id, reply })?
    }

    pub fn blocking_post_transform(
        &self,
        id: &str,
        code: String,
    ) -> Result<Option<String>, StyleError> {
        let id = id.to_string();
        self.blocking_ask(|reply| StyleMsg::PostTransform { id, code, reply })
    }

    pub fn blocking_ready(&self, url: &str) -> Result<ReadyOutcome, StyleError> {
        let url = url.to_string();
        self.blocking_ask(|reply| StyleMsg::Ready { url, reply })
    }
}
