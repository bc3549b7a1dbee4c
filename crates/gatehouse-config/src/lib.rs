//! Configuration system for the Gatehouse proxy.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[oauth]` and `[upstream]` sections with built-in defaults
//! - Config file layering (user config dir + project-local overrides)
//! - `.env` loading that never overrides variables already set
//! - Client credential resolution (env var → config file) behind a
//!   [`CredentialsProvider`] trait so tests can inject fake credentials

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, load_dotenv,
    xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{
    CLIENT_ID_ENV, CLIENT_SECRET_ENV, ChainCredentials, ClientCredentials, CredentialsProvider,
    EnvCredentials, OPEN_API_KEY_ENV, SecretSource, SharedCredentials, StaticCredentials,
    resolve_credentials, resolve_open_api_key,
};
pub use types::*;
