//! HTTP middleware stack for the functions service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. CORS

pub mod cors;
pub mod request_id;

pub use cors::cors_layer;
pub use request_id::{
    GATEWAY_REQUEST_ID_HEADER, REQUEST_ID_HEADER, RequestId, request_id_middleware,
};
