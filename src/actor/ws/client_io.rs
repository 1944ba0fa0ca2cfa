use std::net::TcpStream;
use std::time::Duration;

use tungstenite::protocol::Message;

use crate::core::is_shutdown;
use crate::reload::message::HmrPayload;

use super::{Clients, WsActor};

impl WsActor {
    /// Add a new client connection
    pub(super) fn add_client(&self, stream: TcpStream) {
        // Handshake in blocking mode, poll reads afterwards
        let mut ws = match tungstenite::accept(stream) {
            Ok(ws) => ws,
            Err(e) => {
                crate::log!("ws"; "handshake failed: {}", e);
                return;
            }
        };
        let _ = ws.get_ref().set_nonblocking(true);

        let connected = HmrPayload::connected();
        if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
            crate::log!("ws"; "failed to send connected message: {}", e);
            return;
        }

        if let Some(ref err) = self.pending_error {
            if let Err(e) = ws.send(Message::Text(err.to_json().into())) {
                crate::log!("ws"; "failed to send pending error: {}", e);
            } else {
                crate::debug!("ws"; "sent pending error to new client");
            }
        }

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("ws"; "client connected (total: {})", clients.len());
    }

    /// Background thread draining client frames (non-blocking poll).
    ///
    /// Clients never send anything meaningful; reading keeps ping/close
    /// handling alive and prunes dead connections.
    pub(super) fn client_reader_loop(clients: Clients) {
        while !is_shutdown() {
            std::thread::sleep(Duration::from_millis(100));

            clients.lock().retain_mut(|ws| match ws.read() {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    true
                }
                Err(e) => {
                    crate::debug!("ws"; "client dropped: {}", e);
                    false
                }
            });
        }
    }
}
