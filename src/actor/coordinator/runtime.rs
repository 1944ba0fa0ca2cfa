use std::time::Duration;

use super::{ActorSystem, InitialScan};
use crate::actor::handle::StyleHandle;
use crate::actor::messages::WsMsg;
use crate::engine::{collect_sources, read_sources};

/// Run all actors concurrently.
pub(super) async fn run_actors(system: ActorSystem) {
    let ActorSystem {
        style_actor,
        ws_actor,
        fs_actor,
        scan,
        style,
        ws_tx,
        shutdown_rx,
        ..
    } = system;

    let style_handle = tokio::spawn(style_actor.run());
    let ws_handle = tokio::spawn(ws_actor.run());
    let fs_handle = fs_actor.map(|fs| tokio::spawn(fs.run()));

    if let Some(scan) = scan {
        let style = style.clone();
        tokio::spawn(async move { initial_scan(scan, style).await });
    }

    if let Some(rx) = shutdown_rx {
        loop {
            if rx.try_recv().is_ok() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    } else {
        let _ = style_handle.await;
    }

    style.shutdown().await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    if let Some(handle) = fs_handle {
        handle.abort();
    }
    let _ = tokio::time::timeout(Duration::from_millis(500), ws_handle).await;
}

/// Walk the root and extract every accepted source.
async fn initial_scan(scan: InitialScan, style: StyleHandle) {
    let InitialScan { root, extractor } = scan;
    let sources = tokio::task::spawn_blocking(move || {
        let files = collect_sources(&root, |id| extractor.matches_id(id));
        read_sources(&files)
    })
    .await
    .unwrap_or_default();

    let count = sources.len();
    for source in sources {
        let sent = if source.is_html() {
            style.transform_html(&source.id, source.code).await
        } else {
            style.transform(&source.id, source.code).await
        };
        if sent.is_err() {
            return;
        }
    }
    crate::debug!("scan"; "initial scan: {} files", count);
}
