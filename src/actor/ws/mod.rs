//! WebSocket Actor - Live-Update Transport
//!
//! This actor is responsible for:
//! - Managing WebSocket client connections
//! - Broadcasting update and error payloads to all connected clients
//! - Replaying the last error notice to clients that connect later
//!
//! # Architecture
//!
//! ```text
//! StyleActor --(HostSession)--[Send]--> WsActor --[broadcast]--> Clients
//! WS listener ----------[AddClient]------^
//! ```

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::messages::WsMsg;
use crate::reload::message::HmrPayload;

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared for broadcast + read threads)
    clients: Clients,
    /// Last error notice, replayed to new clients until the next update
    pending_error: Option<HmrPayload>,
}

impl WsActor {
    pub fn new(rx: mpsc::Receiver<WsMsg>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: None,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Send(payload) => {
                    self.remember(&payload);
                    self.broadcast(&payload);
                }

                WsMsg::AddClient(stream) => {
                    self.add_client(stream);
                }

                WsMsg::Shutdown => {
                    crate::debug!("ws"; "shutting down");
                    let mut clients = self.clients.lock();
                    for mut ws in clients.drain(..) {
                        let _ = ws.close(None);
                    }
                    break;
                }
            }
        }
    }

    /// Track the error notice new clients should see.
    fn remember(&mut self, payload: &HmrPayload) {
        match payload {
            HmrPayload::Error { .. } => self.pending_error = Some(payload.clone()),
            HmrPayload::Update { .. } => self.pending_error = None,
            HmrPayload::Connected { .. } => {}
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}
