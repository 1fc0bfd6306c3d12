//! HTTP response helpers.

use anyhow::Result;
use serde::Serialize;
use std::io::Read;
use tiny_http::{Header, Request, Response, StatusCode};

pub const SVG: &str = "image/svg+xml; charset=utf-8";
pub const PNG: &str = "image/png";
pub const JSON: &str = "application/json";

/// Headers image proxies in front of README renderers expect.
const EMBED_HEADERS: [(&str, &str); 4] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Access-Control-Allow-Origin", "*"),
    ("X-Content-Type-Options", "nosniff"),
    ("Content-Security-Policy", "default-src 'none'; style-src 'unsafe-inline'; img-src data:"),
];

fn with_headers<R: Read>(mut response: Response<R>, headers: &[(&str, &str)]) -> Response<R> {
    for (key, value) in headers {
        if let Ok(header) = Header::from_bytes(key.as_bytes(), value.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}

/// SVG widget. Always 200 so embedding contexts show the image, error panels included.
pub fn send_svg(request: Request, svg: String) -> Result<u16> {
    let response = with_headers(Response::from_string(svg), &[("Content-Type", SVG)]);
    let response = with_headers(response, &EMBED_HEADERS);
    request.respond(response.with_status_code(StatusCode(200)))?;
    Ok(200)
}

pub fn send_png(request: Request, png: Vec<u8>, max_age_secs: u64) -> Result<u16> {
    let cache_control = format!("public, max-age={max_age_secs}");
    let response = with_headers(
        Response::from_data(png),
        &[
            ("Content-Type", PNG),
            ("Cache-Control", &cache_control),
            ("Access-Control-Allow-Origin", "*"),
        ],
    );
    request.respond(response.with_status_code(StatusCode(200)))?;
    Ok(200)
}

pub fn send_json<T: Serialize>(request: Request, status: u16, body: &T) -> Result<u16> {
    let body = serde_json::to_vec(body)?;
    let response = with_headers(
        Response::from_data(body),
        &[("Content-Type", JSON), ("Access-Control-Allow-Origin", "*")],
    );
    request.respond(response.with_status_code(StatusCode(status)))?;
    Ok(status)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: String,
}

pub fn send_error(request: Request, status: u16, error: &str, message: String) -> Result<u16> {
    send_json(request, status, &ErrorBody { error, message })
}
