//! Actor Coordinator - Wires up the Dev Server Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels and binds the WebSocket listener
//! - Builds the style coordinator and attaches the host session
//! - Hands the HTTP host a [`DevContext`] and runs the actors
//!
//! Wiring happens on the caller's thread so the HTTP host can start serving
//! before the actor runtime is up.

mod runtime;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::fs::FsActor;
use super::handle::StyleHandle;
use super::messages::{StyleMsg, WsMsg};
use super::style::StyleActor;
use super::ws::WsActor;
use crate::config::DevConfig;
use crate::engine::{CommandGenerator, SplitExtractor};
use crate::reload::HostSession;
use crate::reload::graph::ModuleGraph;
use crate::reload::server::start_ws_server;
use crate::style::{Extractor, StyleCoordinator};

const CHANNEL_BUFFER: usize = 32;

/// What the HTTP host needs from the actor system.
#[derive(Clone)]
pub struct DevContext {
    pub style: StyleHandle,
    pub graph: Arc<ModuleGraph>,
    /// Port the WebSocket listener actually bound.
    pub ws_port: u16,
}

/// Coordinator - wires up the actor system.
pub struct Coordinator {
    config: Arc<DevConfig>,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn with_config(config: Arc<DevConfig>) -> Self {
        Self {
            config,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Create channels, bind sockets and construct every actor.
    ///
    /// `http_port` is the port the HTTP host is listening on.
    pub fn wire(self, http_port: u16) -> Result<ActorSystem> {
        let config = &self.config;
        let (style_tx, style_rx) = mpsc::channel::<StyleMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let ws_port = start_ws_server(config.serve.bind_host(), config.serve.ws_port, ws_tx.clone())
            .context("websocket server failed")?;
        if ws_port != config.serve.ws_port {
            crate::log!("ws"; "port {} in use, using {} instead", config.serve.ws_port, ws_port);
        }
        crate::debug!("ws"; "ws://{}:{}", config.serve.bind_host(), ws_port);

        let extractor = Arc::new(SplitExtractor::from_config(&config.style)?);
        let generator = Arc::new(CommandGenerator::from_config(config));
        let graph = Arc::new(ModuleGraph::new());

        let mut coordinator = StyleCoordinator::new(
            config.style_options(http_port),
            Arc::clone(&extractor) as Arc<dyn Extractor>,
            generator,
        );
        coordinator.attach(Arc::new(HostSession::new(Arc::clone(&graph), ws_tx.clone())));

        let style = StyleHandle::new(style_tx);
        let fs = if config.serve.watch {
            let actor = FsActor::new(config.get_root(), config.state_dir(), style.clone())
                .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
            Some(actor)
        } else {
            None
        };

        Ok(ActorSystem {
            context: DevContext {
                style: style.clone(),
                graph,
                ws_port,
            },
            style_actor: StyleActor::new(style_rx, coordinator),
            ws_actor: WsActor::new(ws_rx),
            fs_actor: fs,
            scan: config.serve.watch.then(|| InitialScan {
                root: config.get_root().to_path_buf(),
                extractor,
            }),
            style,
            ws_tx,
            shutdown_rx: self.shutdown_rx,
        })
    }
}

/// Root walk fed to the style actor once the actors are running.
struct InitialScan {
    root: PathBuf,
    extractor: Arc<SplitExtractor>,
}

/// Wired actors, ready to run.
pub struct ActorSystem {
    context: DevContext,
    style_actor: StyleActor,
    ws_actor: WsActor,
    fs_actor: Option<FsActor>,
    scan: Option<InitialScan>,
    style: StyleHandle,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
}

impl ActorSystem {
    pub fn context(&self) -> DevContext {
        self.context.clone()
    }

    /// Run every actor until the shutdown signal (or the actors) end.
    pub async fn run(self) -> Result<()> {
        crate::debug!("actor"; "start");
        runtime::run_actors(self).await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
