//! Client credential resolution.
//!
//! The token cache never reads the environment itself. It is handed a
//! [`CredentialsProvider`], resolved once at startup:
//! 1. Environment variables (`BLIZZARD_CLIENT_ID`, `BLIZZARD_CLIENT_SECRET`)
//! 2. Config file `[oauth]` values (with a load warning)
//!
//! Tests inject a [`StaticCredentials`] instead.

use std::sync::Arc;

use crate::{OAuthSection, UpstreamSection};

/// Environment variable holding the OAuth client id.
pub const CLIENT_ID_ENV: &str = "BLIZZARD_CLIENT_ID";

/// Environment variable holding the OAuth client secret.
pub const CLIENT_SECRET_ENV: &str = "BLIZZARD_CLIENT_SECRET";

/// Environment variable holding the optional open-upstream API key.
pub const OPEN_API_KEY_ENV: &str = "RAIDERIO_API_KEY";

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable (possibly populated from `.env`).
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
    /// Supplied directly in code.
    Static,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
            SecretSource::Static => write!(f, "static"),
        }
    }
}

/// An OAuth client id/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub source: SecretSource,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            source: SecretSource::Static,
        }
    }

    fn complete(id: Option<String>, secret: Option<String>, source: SecretSource) -> Option<Self> {
        match (id, secret) {
            (Some(client_id), Some(client_secret))
                if !client_id.is_empty() && !client_secret.is_empty() =>
            {
                Some(Self {
                    client_id,
                    client_secret,
                    source,
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .field("source", &self.source)
            .finish()
    }
}

/// Supplies OAuth client credentials on demand.
///
/// Returning `None` means credentials are not configured; callers surface
/// that as a configuration error rather than failing at startup.
pub trait CredentialsProvider: Send + Sync + std::fmt::Debug {
    fn client_credentials(&self) -> Option<ClientCredentials>;
}

/// Shared credentials provider.
pub type SharedCredentials = Arc<dyn CredentialsProvider>;

// ─────────────────────────────────────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────────────────────────────────────

/// Reads credentials from two environment variables.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    id_var: String,
    secret_var: String,
}

impl EnvCredentials {
    /// Use `BLIZZARD_CLIENT_ID` / `BLIZZARD_CLIENT_SECRET`.
    pub fn new() -> Self {
        Self::with_vars(CLIENT_ID_ENV, CLIENT_SECRET_ENV)
    }

    pub fn with_vars(id_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            id_var: id_var.into(),
            secret_var: secret_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialsProvider for EnvCredentials {
    fn client_credentials(&self) -> Option<ClientCredentials> {
        ClientCredentials::complete(
            std::env::var(&self.id_var).ok(),
            std::env::var(&self.secret_var).ok(),
            SecretSource::EnvVar(self.id_var.clone()),
        )
    }
}

/// Fixed credentials, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials(Option<ClientCredentials>);

impl StaticCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self(Some(ClientCredentials::new(client_id, client_secret)))
    }

    /// A provider that never has credentials.
    pub fn missing() -> Self {
        Self(None)
    }

    /// Credentials taken from a config file `[oauth]` section.
    pub fn from_config(section: &OAuthSection) -> Self {
        Self(ClientCredentials::complete(
            section.client_id.clone(),
            section.client_secret.clone(),
            SecretSource::ConfigFile,
        ))
    }
}

impl CredentialsProvider for StaticCredentials {
    fn client_credentials(&self) -> Option<ClientCredentials> {
        self.0.clone()
    }
}

/// Tries each provider in order, returning the first complete pair.
#[derive(Debug, Default)]
pub struct ChainCredentials {
    providers: Vec<SharedCredentials>,
}

impl ChainCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialsProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }
}

impl CredentialsProvider for ChainCredentials {
    fn client_credentials(&self) -> Option<ClientCredentials> {
        self.providers.iter().find_map(|p| p.client_credentials())
    }
}

/// Build the standard provider chain: environment first, then config file.
pub fn resolve_credentials(section: &OAuthSection) -> SharedCredentials {
    Arc::new(
        ChainCredentials::new()
            .with(EnvCredentials::new())
            .with(StaticCredentials::from_config(section)),
    )
}

/// API key for the open upstream: `RAIDERIO_API_KEY`, then `[upstream] api_key`.
/// Empty values count as unset.
pub fn resolve_open_api_key(section: &UpstreamSection) -> Option<(String, SecretSource)> {
    resolve_api_key_from(OPEN_API_KEY_ENV, section)
}

fn resolve_api_key_from(var: &str, section: &UpstreamSection) -> Option<(String, SecretSource)> {
    std::env::var(var)
        .ok()
        .filter(|k| !k.is_empty())
        .map(|k| (k, SecretSource::EnvVar(var.to_string())))
        .or_else(|| {
            section
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .map(|k| (k, SecretSource::ConfigFile))
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
