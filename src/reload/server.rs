//! WebSocket listener for the live-update transport.
//!
//! Accepted sockets are handed to `WsActor` over its channel; the actor does
//! the handshake and owns the connection afterwards.

use std::net::TcpListener;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::Sender;

use crate::actor::messages::WsMsg;
use crate::core::is_shutdown;

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Bind the WebSocket listener and forward clients to `ws_tx`.
///
/// Returns the port actually bound (may differ from `base_port`).
pub fn start_ws_server(host: &str, base_port: u16, ws_tx: Sender<WsMsg>) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(host, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;

    std::thread::spawn(move || {
        while !is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("ws"; "client connected: {}", addr);
                    let _ = stream.set_nonblocking(false);
                    if ws_tx.blocking_send(WsMsg::AddClient(stream)).is_err() {
                        crate::debug!("ws"; "actor gone, listener stopping");
                        break;
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(host: &str, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind websocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_retries_next_port() {
        let (first, port) = try_bind_port("127.0.0.1", 0, 1).unwrap();
        let (_second, next) = try_bind_port("127.0.0.1", port, 3).unwrap();
        assert_ne!(port, next);
        drop(first);
    }

    #[tokio::test]
    async fn test_accepted_client_reaches_actor() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let port = start_ws_server("127.0.0.1", 0, tx).unwrap();

        let _stream = std::net::TcpStream::connect(("127.0.0.1", port)).unwrap();
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(matches!(msg, Some(WsMsg::AddClient(_))));
    }
}
