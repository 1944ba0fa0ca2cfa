//! Development server with live style updates.
//!
//! Route order for every request:
//!
//! 1. readiness middleware (`<base>/__unodev_ready/<ts>`)
//! 2. client runtime (`<base>/@unodev/client.js`)
//! 3. virtual style modules (`<base>/@id/<specifier>` or a resolved entry id)
//! 4. static files under the project root
//! 5. 404

mod content;
mod lifecycle;
mod path;
mod response;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::actor::{Coordinator, DevContext};
use crate::config::{DevConfig, cfg};
use crate::core::{decode_request_path, is_shutdown, strip_base};
use crate::embed::serve::{CLIENT_JS, CLIENT_PATH, ClientVars, STYLE_MODULE_JS, StyleModuleVars};
use crate::style::{ReadyOutcome, resolve_entry};
use crate::utils::mime;
use crate::{debug, log};
use content::{ID_PREFIX, inject_client, rewrite_entry_imports};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Request worker threads.
const POOL_SIZE: usize = 4;

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    port: u16,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop.
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let host = config.serve.bind_host();
    let (server, port) =
        lifecycle::bind_with_retry(host, config.serve.port.unwrap_or(DEFAULT_PORT))?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    Ok(BoundServer {
        server,
        port,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Wire the actors and run the request loop (blocking).
    pub fn run(self) -> Result<()> {
        let config = cfg();
        let system = Coordinator::with_config(Arc::clone(&config))
            .with_shutdown_signal(self.shutdown_rx)
            .wire(self.port)?;
        let ctx = system.context();

        let served = config.serve.resolve_bound(self.port);
        log!("serve"; "{}{}/", served.origin, served.base);

        let actors = lifecycle::spawn_actors(system);
        run_request_loop(&self.server, ctx)?;
        lifecycle::wait_for_shutdown(actors);
        Ok(())
    }
}

/// Entry point of the `serve` subcommand.
pub fn serve() -> Result<()> {
    bind_server()?.run()
}

fn run_request_loop(server: &Server, ctx: DevContext) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(POOL_SIZE)
        .build()?;

    for request in server.incoming_requests() {
        let ctx = ctx.clone();
        pool.spawn(move || {
            let config = cfg();
            if let Err(e) = handle_request(request, &ctx, &config) {
                log!("serve"; "request error: {e:#}");
            }
        });
    }
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &DevContext, config: &DevConfig) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();
    if let ReadyOutcome::Handled { resynced } = ctx.style.blocking_ready(&url)? {
        debug!("serve"; "ready ping{}", if resynced { " (resync)" } else { "" });
        return response::respond_ready(request);
    }

    let base = config.serve.resolve().base;
    let Some(rest) = strip_base(&url, &base) else {
        return response::respond_not_found(request);
    };
    let path = decode_request_path(rest);

    if path == CLIENT_PATH {
        let js = CLIENT_JS.render(&ClientVars {
            ws_port: ctx.ws_port,
            base: &base,
        });
        return response::respond_js(request, js);
    }

    if let Some(id) = style_module_id(ctx, &path)? {
        return respond_style_module(request, ctx, &id, &base);
    }

    if let Some(file) = path::resolve_path(&path, config.get_root()) {
        return respond_source(request, ctx, &file, &base);
    }

    response::respond_not_found(request)
}

/// Resolved id if `path` names a virtual style module.
fn style_module_id(ctx: &DevContext, path: &str) -> Result<Option<String>> {
    let specifier = match path.strip_prefix(ID_PREFIX) {
        Some(specifier) => specifier,
        None if resolve_entry(path).is_some() => path,
        None => return Ok(None),
    };
    Ok(ctx.style.blocking_resolve(specifier)?)
}

/// Serve a style entry as a hot JS module, through the module graph cache.
fn respond_style_module(request: Request, ctx: &DevContext, id: &str, base: &str) -> Result<()> {
    let node = ctx.graph.ensure(id);
    if let Some(code) = node.cached() {
        return response::respond_js(request, code);
    }

    let generation = node.generation();
    let css = match ctx.style.blocking_load(id) {
        Ok(Some(css)) => css,
        Ok(None) => return response::respond_not_found(request),
        Err(e) => {
            log!("error"; "{}: {}", id, e);
            return response::respond_error(request, &e);
        }
    };

    let client = format!("{base}{CLIENT_PATH}");
    let code = STYLE_MODULE_JS.render(&StyleModuleVars {
        client: &client,
        id,
        css: &css,
    });
    let code = ctx
        .style
        .blocking_post_transform(id, code.clone())?
        .unwrap_or(code);

    if !ctx.graph.store_if_current(&node, generation, code.clone()) {
        debug!("serve"; "{} invalidated during load, not cached", id);
    }
    response::respond_js(request, code)
}

/// Serve a file from the root, extracting from it on the way out.
fn respond_source(request: Request, ctx: &DevContext, file: &Path, base: &str) -> Result<()> {
    let content_type = mime::from_path(file);
    let body = std::fs::read(file)?;
    if !mime::is_text(content_type) {
        return response::respond_body(request, content_type, body);
    }
    let code = match String::from_utf8(body) {
        Ok(code) => code,
        Err(e) => return response::respond_body(request, content_type, e.into_bytes()),
    };

    let id = file.to_string_lossy();
    let out = if content_type == mime::types::HTML {
        ctx.style.blocking_transform_html(&id, code.clone())?;
        inject_client(&rewrite_entry_imports(&code, base), base)
    } else {
        ctx.style.blocking_transform(&id, code.clone())?;
        rewrite_entry_imports(&code, base).into_owned()
    };
    response::respond_body(request, content_type, out.into_bytes())
}
