//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use gatehouse_config::{DEFAULT_INDEX_FILE, DEFAULT_PORT, ServerSection};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Directory served for non-API paths. `None` disables static serving.
    pub static_root: Option<PathBuf>,

    /// File served for `/`.
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            static_root: None,
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[server]` config section.
    pub fn from_section(section: &ServerSection) -> gatehouse_config::Result<Self> {
        Ok(Self {
            bind_address: section.socket_addr()?,
            static_root: section.static_root.clone(),
            index_file: section.index_file.clone(),
        })
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Serve static files from `root`.
    pub fn with_static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = Some(root.into());
        self
    }

    pub fn with_index_file(mut self, index_file: impl Into<String>) -> Self {
        self.index_file = index_file.into();
        self
    }
}
