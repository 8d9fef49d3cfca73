//! Page fallback.
//!
//! The UI is a client bundle; the gateway only serves the shell it mounts into.
//! Requests reach this handler after the gate has allowed them.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};

use crate::api::ApiError;
use crate::gate::{RouteTable, is_api_path};

/// Script the shell loads; served from the static prefix.
const BUNDLE_PATH: &str = "/assets/app.js";

pub async fn page_shell(
    State(routes): State<Arc<RouteTable>>,
    method: Method,
    uri: Uri,
) -> Response {
    let path = uri.path();

    if is_api_path(path) {
        return ApiError::not_found(format!("No API route for {}", path)).into_response();
    }
    if routes.is_static_asset(path) {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    Html(render_shell(path)).into_response()
}

fn render_shell(path: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "<title>Monolith</title>\n",
            "</head>\n",
            "<body>\n",
            "<div id=\"root\" data-route=\"{}\"></div>\n",
            "<script type=\"module\" src=\"{}\"></script>\n",
            "</body>\n",
            "</html>\n"
        ),
        escape_attribute(path),
        BUNDLE_PATH
    )
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
