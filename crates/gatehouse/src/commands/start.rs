//! Start command - launches the forwarding server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use gatehouse_config::{GatehouseConfig, resolve_credentials, resolve_open_api_key};
use gatehouse_oauth::{OAuthConfig, TokenCache};
use gatehouse_server::{
    DomainAllowList, Forwarder, RelayPolicy, Server, ServerConfig, UpstreamProfile,
};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory of static files to serve (overrides config)
    #[arg(long)]
    pub static_root: Option<PathBuf>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Environment file loaded before reading credentials
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load_configuration(args.config.as_deref(), &args.env_file, ctx)?;
    let config = &loaded.config;

    let server_config = server_config_with_overrides(config, &args)?;
    let upstream = config.upstream();
    let oauth = config.oauth();
    let client = super::build_http_client(&upstream)?;

    // ── Credentials ─────────────────────────────────────────────────────

    let credentials = resolve_credentials(&oauth);
    match credentials.client_credentials() {
        Some(creds) if ctx.verbose => eprintln!("Credentials from: {}", creds.source),
        Some(_) => {}
        None => {
            tracing::warn!("OAuth client credentials are not configured");
            eprintln!(
                "warning: BLIZZARD_CLIENT_ID / BLIZZARD_CLIENT_SECRET not set; /api/blizzard will answer 500"
            );
        }
    }

    let api_key = resolve_open_api_key(&upstream).map(|(key, source)| {
        if ctx.verbose {
            eprintln!("Open upstream API key from: {}", source);
        }
        key
    });

    // ── Forwarders ──────────────────────────────────────────────────────

    let policy = if upstream.validate_json {
        RelayPolicy::ValidateJson
    } else {
        RelayPolicy::Raw
    };

    let tokens = Arc::new(
        TokenCache::new(OAuthConfig::from(&oauth), credentials).with_client(client.clone()),
    );

    let open = Forwarder::with_profile(UpstreamProfile::Open {
        user_agent: upstream.user_agent.clone(),
        referer: upstream.referer.clone(),
        api_key,
    })
    .with_client(client.clone())
    .with_policy(policy);

    let allow_list = DomainAllowList::new(upstream.allowed_domains.iter().cloned());
    let authenticated = Forwarder::authenticated(allow_list, tokens)
        .with_client(client)
        .with_policy(policy);

    // ── Serve ───────────────────────────────────────────────────────────

    let addr = server_config.bind_address;
    if ctx.verbose {
        eprintln!("Token endpoint: {}", oauth.token_url);
        eprintln!("Allowed domains: {}", upstream.allowed_domains.join(", "));
        match &server_config.static_root {
            Some(root) => eprintln!("Static root: {}", root.display()),
            None => eprintln!("Static files: disabled"),
        }
    }
    println!("Gatehouse listening on http://{}", addr);

    Server::new(server_config, open, authenticated)
        .run_with_shutdown(addr, shutdown_signal())
        .await?;

    Ok(())
}

/// `[server]` section with CLI flags applied on top.
fn server_config_with_overrides(
    config: &GatehouseConfig,
    args: &StartArgs,
) -> Result<ServerConfig> {
    let mut section = config.server();
    if let Some(ref bind) = args.bind {
        section.bind = bind.clone();
    }
    if let Some(port) = args.port {
        section.port = port;
    }
    if let Some(ref root) = args.static_root {
        section.static_root = Some(root.clone());
    }
    Ok(ServerConfig::from_section(&section)?)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
