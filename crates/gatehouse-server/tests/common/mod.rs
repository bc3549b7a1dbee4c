//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use gatehouse_config::{SharedCredentials, StaticCredentials};
use gatehouse_oauth::{OAuthConfig, TokenCache};
use gatehouse_server::{DomainAllowList, Forwarder, RelayPolicy, Server, ServerConfig};

/// Knobs for a test server.
pub struct TestOptions {
    /// Token endpoint URL (usually a wiremock server).
    pub token_url: String,
    pub credentials: SharedCredentials,
    pub relay_policy: RelayPolicy,
    /// Files written into a temporary static root, as (relative path, contents).
    pub static_files: Vec<(&'static str, &'static str)>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            token_url: "http://127.0.0.1:9/token".to_string(),
            credentials: Arc::new(StaticCredentials::new("id", "secret")),
            relay_policy: RelayPolicy::Raw,
            static_files: Vec::new(),
        }
    }
}

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client for talking to the server.
    pub client: Client,
    /// Token cache behind `/api/blizzard`.
    pub tokens: Arc<TokenCache>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
    /// Static root (kept alive for the server's lifetime).
    pub temp_dir: TempDir,
}

impl TestServer {
    /// Start a server with default options.
    pub async fn start() -> Result<Self> {
        Self::start_with(TestOptions::default()).await
    }

    /// Start a server with custom options.
    pub async fn start_with(options: TestOptions) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        for (path, contents) in &options.static_files {
            let full = temp_dir.path().join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full, contents)?;
        }

        // Find an available port
        let addr = find_available_port().await?;

        let tokens = Arc::new(TokenCache::new(
            OAuthConfig::default().with_token_url(options.token_url),
            options.credentials,
        ));

        // Loopback is allow-listed so wiremock can stand in for Battle.net
        let allow_list = DomainAllowList::new([".battle.net", ".blizzard.com", "127.0.0.1"]);

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_static_root(temp_dir.path());
        let server = Server::new(
            config,
            Forwarder::open().with_policy(options.relay_policy),
            Forwarder::authenticated(allow_list, tokens.clone()).with_policy(options.relay_policy),
        );

        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        // Wait for server to be ready
        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            tokens,
            _handle: handle,
            temp_dir,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET a server path.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// OPTIONS a server path.
    pub fn options(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(reqwest::Method::OPTIONS, format!("{}{}", self.base_url(), path))
    }

    /// GET `route` with `target` passed as the `url` parameter.
    pub fn forward(&self, route: &str, target: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), route))
            .query(&[("url", target)])
    }
}

/// Find an available port for the test server.
pub async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
