//! Outbound forwarding of a caller-supplied target URL.
//!
//! A [`Forwarder`] is configured with an [`UpstreamProfile`] deciding which
//! targets are acceptable and which headers are attached:
//!
//! - [`UpstreamProfile::Open`]: any http(s) target, browser-like headers so
//!   upstream bot detection is less likely to serve a block page, plus an
//!   optional static bearer key.
//! - [`UpstreamProfile::Authenticated`]: allow-listed hosts only, with a
//!   bearer token from the shared token cache.
//!
//! The upstream body is buffered whole. If it looks like HTML the upstream is
//! assumed to have served a block page and a 403 is returned instead of the
//! page. Otherwise status, body and most headers are relayed verbatim.

use axum::body::Body;
use axum::http::header::{
    ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_LENGTH, REFERER, TRANSFER_ENCODING, USER_AGENT,
};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use gatehouse_config::DEFAULT_USER_AGENT;
use gatehouse_oauth::{SharedTokenProvider, TokenProvider};
use url::Url;

use crate::allowlist::{DomainAllowList, parse_target};
use crate::cors::{apply_cors_headers, preflight_headers};
use crate::error::{ProxyError, Result};

/// Upstream headers never copied to the caller. The body is re-framed, so
/// its length and transfer coding are recomputed.
fn is_relayed(name: &HeaderName) -> bool {
    ![TRANSFER_ENCODING, CONNECTION, CONTENT_LENGTH].contains(name)
}

const ACCEPT_JSON: &str = "application/json";

/// An inbound request to forward.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub target_url: Option<String>,
    pub method: Method,
}

impl ForwardRequest {
    pub fn new(method: Method, target_url: Option<String>) -> Self {
        Self { target_url, method }
    }

    pub fn get(target_url: impl Into<String>) -> Self {
        Self::new(Method::GET, Some(target_url.into()))
    }
}

/// What is sent back to the caller.
#[derive(Debug, Clone)]
pub struct ForwardResult {
    pub status: StatusCode,
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl ForwardResult {
    /// Empty 200 answering a CORS preflight.
    pub fn preflight() -> Self {
        Self {
            status: StatusCode::OK,
            body: Bytes::new(),
            headers: preflight_headers(),
        }
    }

    /// Relay an upstream response, dropping hop-by-hop headers and
    /// overwriting CORS headers.
    pub fn relay(status: StatusCode, upstream_headers: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::with_capacity(upstream_headers.len());
        for (name, value) in upstream_headers {
            if is_relayed(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        apply_cors_headers(&mut headers);

        Self {
            status,
            body,
            headers,
        }
    }
}

impl IntoResponse for ForwardResult {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// How the upstream body is checked before relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayPolicy {
    /// Relay bytes untouched (after the HTML check).
    #[default]
    Raw,
    /// Additionally require the body to parse as JSON.
    ValidateJson,
}

/// Which upstream a forwarder talks to and how.
#[derive(Debug, Clone)]
pub enum UpstreamProfile {
    Open {
        user_agent: String,
        referer: Option<String>,
        /// Sent as `Authorization: Bearer <key>` when set.
        api_key: Option<String>,
    },
    Authenticated {
        allow_list: DomainAllowList,
        tokens: SharedTokenProvider,
    },
}

/// Forwards GET requests to a caller-chosen upstream URL.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    profile: UpstreamProfile,
    policy: RelayPolicy,
}

impl Forwarder {
    /// Forwarder for the unauthenticated upstream.
    pub fn open() -> Self {
        Self::with_profile(UpstreamProfile::Open {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
            api_key: None,
        })
    }

    /// Forwarder for the OAuth-protected upstream.
    pub fn authenticated(allow_list: DomainAllowList, tokens: SharedTokenProvider) -> Self {
        Self::with_profile(UpstreamProfile::Authenticated { allow_list, tokens })
    }

    pub fn with_profile(profile: UpstreamProfile) -> Self {
        Self {
            client: reqwest::Client::new(),
            profile,
            policy: RelayPolicy::default(),
        }
    }

    /// Use a specific HTTP client (timeouts, pooling).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_policy(mut self, policy: RelayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn profile(&self) -> &UpstreamProfile {
        &self.profile
    }

    /// Forward one inbound request.
    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardResult> {
        if request.method == Method::OPTIONS {
            return Ok(ForwardResult::preflight());
        }

        let target = request
            .target_url
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ProxyError::MissingTarget)?;

        let outbound = self.prepare(target).await?;

        let response = outbound.send().await.map_err(|e| {
            tracing::warn!(url = %target, error = %e, "Upstream request failed");
            ProxyError::Network(e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::Network(e.to_string()))?;

        if looks_like_html(&body) {
            tracing::warn!(url = %target, status = %status, "Upstream returned HTML instead of JSON");
            return Err(ProxyError::BlockedResponse);
        }

        if self.policy == RelayPolicy::ValidateJson {
            serde_json::from_slice::<serde::de::IgnoredAny>(&body)
                .map_err(|e| ProxyError::JsonParse(e.to_string()))?;
        }

        tracing::debug!(url = %target, status = %status, bytes = body.len(), "Relaying upstream response");
        Ok(ForwardResult::relay(status, &headers, body))
    }

    /// Validate the target and build the outbound request with the
    /// profile's headers.
    async fn prepare(&self, target: &str) -> Result<reqwest::RequestBuilder> {
        match &self.profile {
            UpstreamProfile::Open {
                user_agent,
                referer,
                api_key,
            } => {
                let url: Url = parse_target(target)?;
                let mut req = self
                    .client
                    .get(url)
                    .header(USER_AGENT, user_agent)
                    .header(ACCEPT, ACCEPT_JSON);
                if let Some(referer) = referer {
                    req = req.header(REFERER, referer);
                }
                if let Some(key) = api_key {
                    req = req.header(AUTHORIZATION, format!("Bearer {}", key));
                }
                Ok(req)
            }
            UpstreamProfile::Authenticated { allow_list, tokens } => {
                let url = allow_list.check(target)?;
                let token = tokens.get_valid_token().await?;
                Ok(self
                    .client
                    .get(url)
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header(ACCEPT, ACCEPT_JSON))
            }
        }
    }
}

/// Whether a body starts (after leading whitespace) with a DOCTYPE or
/// `<html` marker. ASCII case-insensitive.
pub fn looks_like_html(body: &[u8]) -> bool {
    let trimmed = body.trim_ascii_start();
    [b"<!doctype".as_slice(), b"<html".as_slice()]
        .iter()
        .any(|marker| {
            trimmed.len() >= marker.len() && trimmed[..marker.len()].eq_ignore_ascii_case(marker)
        })
}
