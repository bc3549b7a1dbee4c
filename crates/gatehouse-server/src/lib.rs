//! HTTP forwarding server for Gatehouse.
//!
//! Browser code cannot call most game-data APIs directly: they either omit
//! CORS headers or require an OAuth token that must not ship to the client.
//! This crate exposes two forwarding routes that fix both:
//!
//! - `/proxy?url=` forwards to any http(s) URL with browser-like headers
//! - `/api/blizzard?url=` forwards to allow-listed Battle.net hosts with a
//!   cached client-credentials bearer token
//!
//! Every response, including errors and router 404/405s, carries permissive
//! CORS headers. Optional static file serving hosts the browser client.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gatehouse_oauth::{OAuthConfig, TokenCache};
//! use gatehouse_server::{DomainAllowList, Forwarder, Server, ServerConfig};
//!
//! let tokens = Arc::new(TokenCache::new(OAuthConfig::default(), credentials));
//! let server = Server::new(
//!     ServerConfig::default(),
//!     Forwarder::open(),
//!     Forwarder::authenticated(DomainAllowList::battle_net(), tokens),
//! );
//! server.run().await?;
//! ```

pub mod allowlist;
pub mod config;
pub mod cors;
pub mod error;
pub mod forwarder;
pub mod routes;
pub mod state;
pub mod static_files;

pub use allowlist::{DomainAllowList, parse_target};
pub use config::ServerConfig;
pub use error::{ErrorResponse, ProxyError, Result};
pub use forwarder::{
    ForwardRequest, ForwardResult, Forwarder, RelayPolicy, UpstreamProfile, looks_like_html,
};
pub use state::AppState;
pub use static_files::StaticFiles;

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The Gatehouse HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server from its configuration and the two forwarders.
    pub fn new(config: ServerConfig, open: Forwarder, authenticated: Forwarder) -> Self {
        Self {
            state: AppState::new(config, open, authenticated),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        use axum::routing::get;

        Router::new()
            .merge(routes::health_routes())
            .route(
                "/proxy",
                get(routes::open_proxy_handler).options(routes::open_proxy_handler),
            )
            .route(
                "/api/blizzard",
                get(routes::blizzard_proxy_handler).options(routes::blizzard_proxy_handler),
            )
            .fallback(routes::static_handler)
            // Covers router-generated 404/405 and static files
            .layer(cors::allow_origin_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> std::io::Result<()> {
        self.run_with_shutdown(addr, std::future::pending()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, addr: SocketAddr, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let listener = TcpListener::bind(addr).await?;

        info!("Starting server on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
