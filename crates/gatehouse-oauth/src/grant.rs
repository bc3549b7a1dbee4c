//! OAuth 2.0 client-credentials grant.

use std::time::Duration;

use gatehouse_config::{ClientCredentials, OAuthSection};
use serde::Deserialize;

use crate::error::{OAuthError, Result};

/// Upstream error bodies are cut to this many characters in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Token endpoint settings.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub token_url: String,
    /// Tokens are considered expired this long before their real expiry.
    pub expiry_margin: Duration,
    /// Lifetime assumed when the response omits `expires_in`.
    pub default_expires_in: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self::from(&OAuthSection::default())
    }
}

impl From<&OAuthSection> for OAuthConfig {
    fn from(section: &OAuthSection) -> Self {
        Self {
            token_url: section.token_url.clone(),
            expiry_margin: Duration::from_secs(section.expiry_margin_secs),
            default_expires_in: Duration::from_secs(section.default_expires_in_secs),
        }
    }
}

impl OAuthConfig {
    /// Point at a different token endpoint, keeping the other defaults.
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

/// Successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Request a token with the client-credentials grant.
///
/// Sends HTTP Basic auth built from `id:secret` and the form body
/// `grant_type=client_credentials`.
pub async fn request_client_credentials(
    client: &reqwest::Client,
    token_url: &str,
    credentials: &ClientCredentials,
) -> Result<TokenResponse> {
    let response = client
        .post(token_url)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| OAuthError::Network(format!("Token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(OAuthError::UpstreamAuth {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    let token = response
        .json::<TokenResponse>()
        .await
        .map_err(|e| OAuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

    // Only bearer tokens can be attached as `Authorization: Bearer`.
    if let Some(ref kind) = token.token_type
        && !kind.eq_ignore_ascii_case("bearer")
    {
        return Err(OAuthError::InvalidResponse(format!(
            "unsupported token_type '{}'",
            kind
        )));
    }

    Ok(token)
}
