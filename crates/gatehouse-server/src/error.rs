//! Error types for the forwarding routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_oauth::OAuthError;
use serde::Serialize;
use thiserror::Error;

use crate::cors::apply_cors_headers;

/// Result type for forwarding operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Everything that can go wrong while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `url` query parameter.
    #[error("Missing url query parameter")]
    MissingTarget,

    /// Target could not be parsed as an http(s) URL.
    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    /// Target host is not on the allow-list.
    #[error("Forbidden domain: {0}")]
    ForbiddenDomain(String),

    /// Upstream answered with an HTML page instead of JSON.
    #[error("API returned HTML instead of JSON - likely blocked")]
    BlockedResponse,

    /// Upstream body is not valid JSON.
    #[error("Failed to parse API response as JSON: {0}")]
    JsonParse(String),

    /// OAuth client credentials not configured.
    #[error("Missing API credentials: {0}")]
    CredentialsMissing(String),

    /// Token endpoint refused or returned garbage.
    #[error("Token request failed: {0}")]
    UpstreamAuth(String),

    /// DNS, connect, reset, or timeout on an outbound call.
    #[error("Proxy error: {0}")]
    Network(String),
}

impl ProxyError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::ForbiddenDomain(_) | ProxyError::BlockedResponse => StatusCode::FORBIDDEN,
            ProxyError::JsonParse(_) | ProxyError::CredentialsMissing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::UpstreamAuth(_) | ProxyError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Split into the short `error` label and the optional `message` detail.
    fn payload(&self) -> ErrorResponse {
        let (error, message) = match self {
            ProxyError::MissingTarget => ("Missing url query parameter", None),
            ProxyError::InvalidUrl(msg) => ("Invalid url", Some(msg.clone())),
            ProxyError::ForbiddenDomain(host) => (
                "Only Blizzard API domains are allowed",
                Some(host.clone()),
            ),
            ProxyError::BlockedResponse => {
                ("API returned HTML instead of JSON - likely blocked", None)
            }
            ProxyError::JsonParse(msg) => {
                ("Failed to parse API response as JSON", Some(msg.clone()))
            }
            ProxyError::CredentialsMissing(msg) => ("Missing API credentials", Some(msg.clone())),
            ProxyError::UpstreamAuth(msg) => ("Token request failed", Some(msg.clone())),
            ProxyError::Network(msg) => ("Proxy error", Some(msg.clone())),
        };
        ErrorResponse {
            error: error.to_string(),
            message,
        }
    }
}

impl From<OAuthError> for ProxyError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::CredentialsMissing => ProxyError::CredentialsMissing(e.to_string()),
            OAuthError::Network(msg) => ProxyError::Network(msg),
            OAuthError::UpstreamAuth { .. } | OAuthError::InvalidResponse(_) => {
                ProxyError::UpstreamAuth(e.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Short description of what failed.
    pub error: String,
    /// Underlying cause, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = self.payload();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Proxy error");
        } else {
            tracing::warn!(status = %status, error = %self, "Rejected proxy request");
        }

        let mut response = (status, Json(body)).into_response();
        apply_cors_headers(response.headers_mut());
        response
    }
}
