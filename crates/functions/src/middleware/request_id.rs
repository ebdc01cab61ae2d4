//! Request correlation IDs.
//!
//! Handlers sit behind the backend's function gateway, which tags each call
//! with `sb-request-id`. Browser callers may send their own `x-request-id`.
//! The first usable one wins; otherwise a UUID v4 is minted. Caller-supplied
//! IDs end up in logs and Sentry tags, so only short token-like values are
//! trusted.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID assigned by the function gateway.
pub const GATEWAY_REQUEST_ID_HEADER: &str = "sb-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID of the current request, available as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

/// The caller's or gateway's ID, if either is usable.
fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    [REQUEST_ID_HEADER, GATEWAY_REQUEST_ID_HEADER]
        .into_iter()
        .filter_map(|name| headers.get(name)?.to_str().ok())
        .map(str::trim)
        .find(|value| is_token(value))
        .map(String::from)
}

/// Assign a [`RequestId`], record it on the span and Sentry scope, and echo
/// it in `x-request-id`.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id =
        incoming_request_id(request.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_caller_id_preferred_over_gateway() {
        let map = headers(&[
            (REQUEST_ID_HEADER, "req-42"),
            (GATEWAY_REQUEST_ID_HEADER, "gw-7"),
        ]);
        assert_eq!(incoming_request_id(&map).as_deref(), Some("req-42"));
    }

    #[test]
    fn test_gateway_id_used_when_caller_id_unusable() {
        let map = headers(&[
            (REQUEST_ID_HEADER, "has spaces; and=stuff"),
            (GATEWAY_REQUEST_ID_HEADER, "01J0ABCD:edge-1"),
        ]);
        assert_eq!(incoming_request_id(&map).as_deref(), Some("01J0ABCD:edge-1"));
    }

    #[test]
    fn test_untrusted_values_rejected() {
        assert_eq!(incoming_request_id(&headers(&[(REQUEST_ID_HEADER, "")])), None);
        let long = HeaderValue::from_str(&"a".repeat(MAX_REQUEST_ID_LEN + 1)).unwrap();
        let mut map = HeaderMap::new();
        map.insert(REQUEST_ID_HEADER, long);
        assert_eq!(incoming_request_id(&map), None);
        assert_eq!(incoming_request_id(&HeaderMap::new()), None);
    }
}
