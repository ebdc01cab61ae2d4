//! CORS policy shared by every handler.
//!
//! Browsers and the mobile shell call the handlers cross-origin, so any
//! origin is allowed and the headers the client library sends are listed
//! explicitly.

use axum::http::{HeaderName, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Header sent by the hosted client library to identify itself.
const X_CLIENT_INFO: HeaderName = HeaderName::from_static("x-client-info");
/// Anonymous API key header.
const APIKEY: HeaderName = HeaderName::from_static("apikey");

/// Build the CORS layer.
#[must_use]
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            X_CLIENT_INFO,
            APIKEY,
            header::CONTENT_TYPE,
        ])
}
