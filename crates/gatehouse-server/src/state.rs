//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::forwarder::Forwarder;
use crate::static_files::StaticFiles;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Forwarder behind `/proxy`.
    pub open: Arc<Forwarder>,

    /// Forwarder behind `/api/blizzard`.
    pub authenticated: Arc<Forwarder>,

    /// Static file root (None when static serving is disabled).
    pub static_files: Option<Arc<StaticFiles>>,
}

impl AppState {
    /// Create application state. Static serving follows `config.static_root`.
    pub fn new(config: ServerConfig, open: Forwarder, authenticated: Forwarder) -> Self {
        let static_files = config
            .static_root
            .as_ref()
            .map(|root| Arc::new(StaticFiles::new(root, config.index_file.clone())));

        Self {
            config: Arc::new(config),
            open: Arc::new(open),
            authenticated: Arc::new(authenticated),
            static_files,
        }
    }
}
