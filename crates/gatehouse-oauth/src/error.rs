//! Error types for token acquisition.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while obtaining an access token.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Client id or secret not configured.
    #[error(
        "OAuth client credentials are not configured. Set BLIZZARD_CLIENT_ID and BLIZZARD_CLIENT_SECRET"
    )]
    CredentialsMissing,

    /// Token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {body}")]
    UpstreamAuth { status: u16, body: String },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Token endpoint answered 2xx with an unusable body.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
