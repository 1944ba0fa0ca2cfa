use tungstenite::protocol::Message;

use crate::reload::message::HmrPayload;

use super::WsActor;

impl WsActor {
    /// Broadcast a payload to all connected clients
    pub(super) fn broadcast(&self, payload: &HmrPayload) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let msg = Message::Text(payload.to_json().into());
        clients.retain_mut(|ws| match ws.send(msg.clone()) {
            Ok(_) => true,
            Err(e) => {
                crate::debug!("ws"; "client disconnected: {}", e);
                false
            }
        });
        crate::debug!("ws"; "broadcast to {} clients", count);
    }
}
