//! Target URL validation and the trusted-domain allow-list.

use gatehouse_config::DEFAULT_ALLOWED_DOMAINS;
use url::Url;

use crate::error::{ProxyError, Result};

/// Parse a caller-supplied target, accepting only absolute http(s) URLs.
pub fn parse_target(target: &str) -> Result<Url> {
    let url =
        Url::parse(target).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", target, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProxyError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            other
        ))),
    }
}

/// Host suffixes the authenticated upstream may be reached on.
///
/// Matching is a case-sensitive `ends_with` against the parsed host, so
/// `.battle.net` admits `us.api.battle.net` but not `battle.net` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAllowList {
    suffixes: Vec<String>,
}

impl DomainAllowList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    /// `.battle.net` and `.blizzard.com`.
    pub fn battle_net() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS.iter().copied())
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn is_allowed(&self, host: &str) -> bool {
        self.suffixes.iter().any(|suffix| host.ends_with(suffix.as_str()))
    }

    /// Parse `target` and ensure its host is allowed.
    pub fn check(&self, target: &str) -> Result<Url> {
        let url = parse_target(target)?;
        match url.host_str() {
            Some(host) if self.is_allowed(host) => Ok(url),
            Some(host) => Err(ProxyError::ForbiddenDomain(host.to_string())),
            None => Err(ProxyError::ForbiddenDomain(target.to_string())),
        }
    }
}

impl Default for DomainAllowList {
    fn default() -> Self {
        Self::battle_net()
    }
}
