//! The dev server's own [`DevSession`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::graph::{ModuleGraph, ModuleNode};
use super::message::HmrPayload;
use crate::actor::messages::WsMsg;
use crate::style::DevSession;

/// Module graph + WebSocket transport of the built-in HTTP host.
pub struct HostSession {
    graph: Arc<ModuleGraph>,
    ws_tx: mpsc::Sender<WsMsg>,
}

impl HostSession {
    pub fn new(graph: Arc<ModuleGraph>, ws_tx: mpsc::Sender<WsMsg>) -> Self {
        Self { graph, ws_tx }
    }
}

impl DevSession for HostSession {
    fn module_by_id(&self, id: &str) -> Option<Arc<ModuleNode>> {
        self.graph.get(id)
    }

    fn invalidate_module(&self, module: &ModuleNode) {
        self.graph.invalidate(module);
    }

    fn send(&self, payload: HmrPayload) {
        // Called from the style actor; never wait on the socket side.
        match self.ws_tx.try_send(WsMsg::Send(payload)) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => match Handle::try_current() {
                Ok(handle) => {
                    crate::log!("warning"; "websocket queue full, delivering update late");
                    let tx = self.ws_tx.clone();
                    handle.spawn(async move {
                        let _ = tx.send(msg).await;
                    });
                }
                Err(_) => crate::log!("warning"; "websocket queue full, update dropped"),
            },
            Err(TrySendError::Closed(_)) => crate::debug!("ws"; "transport closed, payload dropped"),
        }
    }
}
