//! Request ID middleware.
//!
//! Every request gets an id that is recorded in the tracing span, tagged on
//! the Sentry scope and echoed back in the `x-request-id` response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is accepted as-is.
const MAX_REQUEST_ID_LENGTH: usize = 64;

/// Use the caller's id if it is short and printable, otherwise mint one.
fn resolve_request_id(incoming: Option<&str>) -> String {
    incoming
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id.bytes().all(|b| b.is_ascii_graphic())
        })
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned)
}

/// Middleware that ensures every request has a request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_valid_incoming_id() {
        assert_eq!(resolve_request_id(Some("spa-4f2a")), "spa-4f2a");
    }

    #[test]
    fn test_replaces_missing_or_unusable_id() {
        for incoming in [None, Some(""), Some("has space"), Some(&*"x".repeat(65))] {
            let id = resolve_request_id(incoming);
            assert!(Uuid::parse_str(&id).is_ok(), "{incoming:?} -> {id}");
        }
    }
}
