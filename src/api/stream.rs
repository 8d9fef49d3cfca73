//! Server-sent event passthrough.
//!
//! Bytes are forwarded as they arrive. If the upstream body fails mid-stream a single
//! synthetic error event is written and the stream ends. Dropping the browser
//! response drops the upstream body with it.

use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    http::header,
    response::{IntoResponse, Response},
};
use futures::{StreamExt, stream};
use tracing::warn;

/// Terminal event sent when the upstream stream breaks.
pub const STREAM_INTERRUPTED_EVENT: &str =
    "data: {\"type\":\"error\",\"error\":\"Stream interrupted\",\"done\":true}\n\n";

/// Relay an upstream `text/event-stream` body.
pub fn relay_event_stream(upstream: reqwest::Response) -> Response {
    let chunks = upstream.bytes_stream().boxed();

    let body = stream::unfold(Some(chunks), |state| async move {
        let mut chunks = state?;
        match chunks.next().await {
            Some(Ok(chunk)) => Some((Ok::<Bytes, Infallible>(chunk), Some(chunks))),
            Some(Err(e)) => {
                warn!(error = %e, "Upstream event stream interrupted");
                Some((Ok(Bytes::from_static(STREAM_INTERRUPTED_EVENT.as_bytes())), None))
            }
            None => None,
        }
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_event_is_a_single_json_frame() {
        let payload = STREAM_INTERRUPTED_EVENT
            .strip_prefix("data: ")
            .and_then(|rest| rest.strip_suffix("\n\n"))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(payload).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["error"], "Stream interrupted");
        assert_eq!(value["done"], true);
    }
}
