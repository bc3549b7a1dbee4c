//! Permissive CORS headers.
//!
//! Every response leaving the proxy, success or error, carries these so the
//! calling browser can read the body.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderMap, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// How long browsers may cache a preflight answer (seconds).
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Set or overwrite the CORS headers on a response header map.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Headers for an `OPTIONS` preflight reply.
pub fn preflight_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    apply_cors_headers(&mut headers);
    headers.insert(
        ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(PREFLIGHT_MAX_AGE),
    );
    headers
}

/// Router-wide layer adding `Access-Control-Allow-Origin` to responses that
/// lack it (router 404/405, static files).
pub fn allow_origin_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    )
}
