//! CLI command handlers.

pub mod start;
pub mod token;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, Result};
use gatehouse_config::{LoadedConfig, UpstreamSection};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load `.env`, then the config file (explicit or discovered), printing
/// warnings along the way.
pub fn load_configuration(
    config_path: Option<&Path>,
    env_file: &Path,
    ctx: &Context,
) -> Result<LoadedConfig> {
    match gatehouse_config::load_dotenv(env_file) {
        Ok(true) if ctx.verbose => eprintln!("Loaded environment from {}", env_file.display()),
        Ok(_) => {}
        Err(e) => eprintln!("warning: {}", e),
    }

    let loaded = match config_path {
        Some(path) => LoadedConfig::from_file(path)?,
        None => gatehouse_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            eprintln!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                eprintln!("Loaded config: {}", source.display());
            }
        }
    }

    Ok(loaded)
}

/// Outbound HTTP client shared by the token cache and both forwarders.
pub fn build_http_client(upstream: &UpstreamSection) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = upstream.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build HTTP client")
}
