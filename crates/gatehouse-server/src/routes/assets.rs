//! Fallback handler: preflight for any path, static files otherwise.

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};

use crate::forwarder::ForwardResult;
use crate::state::AppState;
use crate::static_files::not_found;

pub async fn static_handler(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return ForwardResult::preflight().into_response();
    }

    match &state.static_files {
        Some(files) if method == Method::GET || method == Method::HEAD => {
            files.serve(uri.path()).await
        }
        _ => not_found(),
    }
}
