//! Forwarding endpoints.
//!
//! Both routes take the upstream target in the `url` query parameter. The
//! raw query is decoded here rather than through a typed extractor so a
//! malformed query still ends in the JSON error path.

use axum::extract::{RawQuery, State};
use axum::http::Method;

use crate::error::Result;
use crate::forwarder::{ForwardRequest, ForwardResult};
use crate::state::AppState;

/// Name of the query parameter carrying the upstream URL.
pub const TARGET_PARAM: &str = "url";

/// Extract the percent-decoded `url` parameter from a raw query string.
pub fn target_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TARGET_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// `GET|OPTIONS /proxy?url=...`
pub async fn open_proxy_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<ForwardResult> {
    let request = ForwardRequest::new(method, target_from_query(query.as_deref()));
    state.open.forward(request).await
}

/// `GET|OPTIONS /api/blizzard?url=...`
pub async fn blizzard_proxy_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<ForwardResult> {
    let request = ForwardRequest::new(method, target_from_query(query.as_deref()));
    state.authenticated.forward(request).await
}
