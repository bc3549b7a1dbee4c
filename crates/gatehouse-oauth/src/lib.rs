//! OAuth 2.0 client-credentials token cache.
//!
//! Obtains bearer tokens for the Battle.net API and shares a single cached
//! token across all concurrent requests.
//!
//! # Components
//!
//! - [`grant`]: client-credentials token request against the token endpoint
//! - [`token_cache`]: single-slot cache with expiry margin and single-flight refresh
//! - [`clock`]: time source, mockable in tests

pub mod clock;
pub mod error;
pub mod grant;
pub mod token_cache;

pub use clock::{Clock, MockClock, SharedClock, SystemClock};
pub use error::{OAuthError, Result};
pub use grant::{OAuthConfig, TokenResponse, request_client_credentials};
pub use token_cache::{
    CachedToken, MAX_TOKEN_LIFETIME, SharedTokenProvider, TokenCache, TokenInfo, TokenProvider,
};
