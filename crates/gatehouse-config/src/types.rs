//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]      # listen address and static asset root
//! [oauth]       # client-credentials token endpoint and cache tuning
//! [upstream]    # allow-list and outbound request headers
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// File served for `GET /` when a static root is configured.
pub const DEFAULT_INDEX_FILE: &str = "index.html";

/// Battle.net client-credentials token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.battle.net/token";

/// Tokens are treated as expired this many seconds before their real expiry.
pub const DEFAULT_EXPIRY_MARGIN_SECS: u64 = 60;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 86_399;

/// Host suffixes the authenticated route may reach.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &[".battle.net", ".blizzard.com"];

/// Browser-like user agent sent to the open upstream.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. a project-local
/// override that only sets the port) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatehouseConfig {
    pub server: Option<ServerSection>,
    pub oauth: Option<OAuthSection>,
    pub upstream: Option<UpstreamSection>,
}

impl GatehouseConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Sections are replaced whole, not merged field by field.
    pub fn merge(&mut self, other: GatehouseConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.oauth.is_some() {
            self.oauth = other.oauth;
        }
        if other.upstream.is_some() {
            self.upstream = other.upstream;
        }
    }

    /// Server section, or defaults when absent.
    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// OAuth section, or defaults when absent.
    pub fn oauth(&self) -> OAuthSection {
        self.oauth.clone().unwrap_or_default()
    }

    /// Upstream section, or defaults when absent.
    pub fn upstream(&self) -> UpstreamSection {
        self.upstream.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory served for non-API paths. Unset disables static serving.
    pub static_root: Option<PathBuf>,
    /// File served for `/`.
    pub index_file: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            static_root: None,
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl ServerSection {
    /// Combine `bind` and `port` into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|e| ConfigError::InvalidValue {
            field: "server.bind".to_string(),
            message: format!("{}: {}", self.bind, e),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `[oauth]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OAuthSection {
    pub token_url: String,
    /// Plaintext client id. Prefer the `BLIZZARD_CLIENT_ID` env var.
    pub client_id: Option<String>,
    /// Plaintext client secret. Prefer the `BLIZZARD_CLIENT_SECRET` env var.
    pub client_secret: Option<String>,
    pub expiry_margin_secs: u64,
    pub default_expires_in_secs: u64,
}

impl Default for OAuthSection {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: None,
            client_secret: None,
            expiry_margin_secs: DEFAULT_EXPIRY_MARGIN_SECS,
            default_expires_in_secs: DEFAULT_EXPIRES_IN_SECS,
        }
    }
}

impl OAuthSection {
    /// Whether the section carries a secret in plaintext.
    pub fn has_plaintext_secret(&self) -> bool {
        self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// `[upstream]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamSection {
    /// Host suffixes the authenticated route may reach.
    pub allowed_domains: Vec<String>,
    /// User agent for the open route.
    pub user_agent: String,
    /// Fixed `Referer` for the open route.
    pub referer: Option<String>,
    /// Bearer key for the open route. `RAIDERIO_API_KEY` takes precedence.
    pub api_key: Option<String>,
    /// Reject upstream bodies that are not valid JSON.
    pub validate_json: bool,
    /// Outbound request timeout. Unset means the transport default.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: None,
            api_key: None,
            validate_json: false,
            timeout_secs: None,
        }
    }
}
