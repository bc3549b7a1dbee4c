//! Token command - one-off client-credentials grant.
//!
//! Useful for checking that credentials and the token endpoint work before
//! starting the server. The token itself is never printed.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gatehouse_config::resolve_credentials;
use gatehouse_oauth::{OAuthConfig, TokenCache, TokenProvider};

use super::Context;

/// Arguments for the token command.
#[derive(Args, Debug)]
pub struct TokenArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Environment file loaded before reading credentials
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Token endpoint (overrides config)
    #[arg(long)]
    pub token_url: Option<String>,
}

/// Run the token command.
pub async fn run(args: TokenArgs, ctx: &Context) -> Result<()> {
    let loaded = super::load_configuration(args.config.as_deref(), &args.env_file, ctx)?;
    let config = &loaded.config;

    let mut oauth = config.oauth();
    if let Some(url) = args.token_url {
        oauth.token_url = url;
    }

    let credentials = resolve_credentials(&oauth);
    let source = credentials.client_credentials().map(|c| c.source.to_string());
    let client = super::build_http_client(&config.upstream())?;

    let cache = TokenCache::new(OAuthConfig::from(&oauth), credentials).with_client(client);
    cache.get_valid_token().await?;

    let info = cache
        .token_info()
        .await
        .ok_or_else(|| anyhow::anyhow!("Token was not cached after a successful grant"))?;

    if ctx.json_output {
        let output = serde_json::json!({
            "token_url": oauth.token_url,
            "credentials_source": source,
            "obtained_at": info.obtained_at.to_rfc3339(),
            "expires_in_secs": info.expires_in_secs,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Token obtained from {}", oauth.token_url);
        if let Some(source) = source {
            println!("Credentials from: {}", source);
        }
        println!("Expires in: {}", info.expires_in_display());
    }

    Ok(())
}
