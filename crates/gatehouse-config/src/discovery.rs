//! Finding config files and stacking them.
//!
//! Layers, lowest precedence first:
//! 1. `<config dir>/config.toml`, where the config dir is
//!    `GATEHOUSE_CONFIG_DIR` or the platform default
//! 2. `gatehouse.toml` in the working (or given project) directory
//!
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use crate::{ConfigError, GatehouseConfig, Result};

/// Working-directory config file.
const PROJECT_CONFIG_FILE: &str = "gatehouse.toml";

/// Config file inside the config dir.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "gatehouse";

/// Overrides the platform config dir.
const CONFIG_DIR_ENV: &str = "GATEHOUSE_CONFIG_DIR";

/// One layer that was looked for.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Where the layer was expected.
    pub path: PathBuf,
    /// False when the file was absent or unreadable.
    pub loaded: bool,
}

/// Merged configuration plus how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GatehouseConfig,
    /// Sources that were checked, lowest precedence first.
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (unreadable layers, plaintext secrets).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Wrap a single explicitly chosen config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = load_config_file(path)?;
        let mut warnings = Vec::new();
        check_plaintext_secrets(&config, &mut warnings);
        Ok(Self {
            config,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings,
        })
    }

    /// Paths of the layers that contributed.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Discover and merge the config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with an explicit config dir.
///
/// `config_dir` overrides both `GATEHOUSE_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = GatehouseConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    check_plaintext_secrets(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Parse a single config file.
pub fn load_config_file(path: &Path) -> Result<GatehouseConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    GatehouseConfig::from_toml(&contents)
}

/// Load `KEY=value` pairs from a `.env` file into the process environment.
///
/// Variables that are already set are left untouched. A missing file is not
/// an error; returns whether a file was loaded.
pub fn load_dotenv(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(true)
}

/// Get the user config file path for gatehouse.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for gatehouse.
///
/// Checks `GATEHOUSE_CONFIG_DIR` first, then falls back to the platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Merge one layer if present. Unparseable layers become warnings.
fn load_layer(
    config: &mut GatehouseConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Skipped {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

fn check_plaintext_secrets(config: &GatehouseConfig, warnings: &mut Vec<String>) {
    if let Some(ref oauth) = config.oauth
        && oauth.has_plaintext_secret()
    {
        warnings.push(
            "[oauth] contains a plaintext client_secret. \
             Consider setting BLIZZARD_CLIENT_SECRET in the environment or a .env file instead."
                .to_string(),
        );
    }
    if let Some(ref upstream) = config.upstream
        && upstream.api_key.as_deref().is_some_and(|k| !k.is_empty())
    {
        warnings.push(
            "[upstream] contains a plaintext api_key. \
             Consider setting RAIDERIO_API_KEY in the environment or a .env file instead."
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
