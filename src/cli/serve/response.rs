//! HTTP response handlers.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::types::{JAVASCRIPT, PLAIN};

/// Answer a readiness ping: 200 with an empty body.
pub fn respond_ready(request: Request) -> Result<()> {
    let response = Response::empty(StatusCode(200))
        .with_header(make_header("Cache-Control", "no-store"))
        .with_header(make_header("Access-Control-Allow-Origin", "*"));
    request.respond(response)?;
    Ok(())
}

/// Respond with a JavaScript module.
pub fn respond_js(request: Request, code: String) -> Result<()> {
    send_body(request, 200, JAVASCRIPT, code.into_bytes())
}

/// Respond with file content of the given type.
pub fn respond_body(request: Request, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    if is_head_request(&request) {
        let response = Response::empty(StatusCode(200))
            .with_header(make_header("Content-Type", content_type));
        request.respond(response)?;
        return Ok(());
    }
    send_body(request, 200, content_type, body)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, PLAIN, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    send_body(request, 503, PLAIN, b"503 Service Unavailable".to_vec())
}

/// Respond with 500 carrying the error chain.
pub fn respond_error(request: Request, error: &dyn std::fmt::Display) -> Result<()> {
    let body = format!("500 Internal Server Error\n\n{error}");
    send_body(request, 500, PLAIN, body.into_bytes())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
) -> Result<()> {
    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-cache"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static header")
}
