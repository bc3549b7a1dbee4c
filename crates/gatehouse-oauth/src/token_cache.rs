//! Single-slot access token cache.
//!
//! One bearer token is shared by every request that targets the
//! authenticated upstream. A token is served while
//! `now < expires_at - expiry_margin`; after that the next caller refreshes
//! it. Concurrent callers that miss the cache queue on a refresh lock, so at
//! most one token request is in flight and the rest reuse its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gatehouse_config::SharedCredentials;
use tokio::sync::{Mutex, RwLock};

use crate::clock::{SharedClock, SystemClock};
use crate::error::{OAuthError, Result};
use crate::grant::{OAuthConfig, request_client_credentials};

/// Upper bound on a token lifetime, whatever `expires_in` claims.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// ============================================================================
// TokenProvider Trait
// ============================================================================

/// Anything that can hand out a currently valid bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    /// Get a valid access token, refreshing if necessary.
    async fn get_valid_token(&self) -> Result<String>;
}

/// Shared token provider for use across request handlers.
pub type SharedTokenProvider = Arc<dyn TokenProvider>;

// ============================================================================
// CachedToken
// ============================================================================

/// The cached bearer token and when it stops being served.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub expires_at: Instant,
    pub obtained_at: DateTime<Utc>,
}

impl CachedToken {
    /// Whether the token may still be handed out at `now`.
    pub fn is_fresh(&self, now: Instant, margin: Duration) -> bool {
        self.expires_at
            .checked_sub(margin)
            .is_some_and(|cutoff| now < cutoff)
    }
}

// ============================================================================
// TokenCache
// ============================================================================

/// Client-credentials token cache.
#[derive(Debug)]
pub struct TokenCache {
    client: reqwest::Client,
    config: OAuthConfig,
    credentials: SharedCredentials,
    clock: SharedClock,
    slot: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
    refresh_count: AtomicU64,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new(config: OAuthConfig, credentials: SharedCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            credentials,
            clock: Arc::new(SystemClock),
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refresh_count: AtomicU64::new(0),
        }
    }

    /// Use a specific HTTP client for token requests.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Use a specific time source.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Token endpoint settings.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Number of token requests issued so far (successful or not).
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::SeqCst)
    }

    /// Drop the cached token; the next call fetches a new one.
    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }

    /// Expiry information about the cached token, if any.
    pub async fn token_info(&self) -> Option<TokenInfo> {
        let slot = self.slot.read().await;
        let token = slot.as_ref()?;
        let now = self.clock.now();

        Some(TokenInfo {
            obtained_at: token.obtained_at,
            expires_in_secs: token.expires_at.saturating_duration_since(now).as_secs(),
            is_expired: !token.is_fresh(now, self.config.expiry_margin),
        })
    }

    async fn fresh_token(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|t| t.is_fresh(self.clock.now(), self.config.expiry_margin))
            .map(|t| t.value.clone())
    }

    async fn refresh(&self) -> Result<String> {
        let credentials = self
            .credentials
            .client_credentials()
            .ok_or(OAuthError::CredentialsMissing)?;

        self.refresh_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(token_url = %self.config.token_url, "Requesting access token");

        let response =
            request_client_credentials(&self.client, &self.config.token_url, &credentials).await?;

        let lifetime = response
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_expires_in)
            .min(MAX_TOKEN_LIFETIME);
        let expires_at = self.clock.now().checked_add(lifetime).ok_or_else(|| {
            OAuthError::InvalidResponse(format!(
                "expires_in of {}s is out of range",
                lifetime.as_secs()
            ))
        })?;

        *self.slot.write().await = Some(CachedToken {
            value: response.access_token.clone(),
            expires_at,
            obtained_at: Utc::now(),
        });

        tracing::info!(
            expires_in_secs = lifetime.as_secs(),
            source = %credentials.source,
            "Obtained access token"
        );
        Ok(response.access_token)
    }
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn get_valid_token(&self) -> Result<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // A concurrent caller may have refreshed while we waited for the lock.
        if let Some(token) = self.fresh_token().await {
            tracing::debug!("Reusing token refreshed by a concurrent request");
            return Ok(token);
        }

        self.refresh().await
    }
}

// ============================================================================
// TokenInfo
// ============================================================================

/// Information about the cached token for display.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub obtained_at: DateTime<Utc>,
    pub expires_in_secs: u64,
    pub is_expired: bool,
}

impl TokenInfo {
    pub fn expires_in_display(&self) -> String {
        if self.is_expired {
            "Expired (will refresh on next use)".to_string()
        } else {
            let hours = self.expires_in_secs / 3600;
            let minutes = (self.expires_in_secs % 3600) / 60;
            format!("{}h {}m", hours, minutes)
        }
    }
}
