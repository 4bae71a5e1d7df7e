//! Application configuration for WebScout.
//!
//! User config lives at `~/.webscout/webscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WebScoutError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "webscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".webscout";

/// Expected prefix of a Tavily API key.
const API_KEY_PREFIX: &str = "tvly-";

// ---------------------------------------------------------------------------
// Config structs (matching webscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tavily search-provider settings.
    #[serde(default)]
    pub tavily: TavilyConfig,

    /// Research pipeline settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Result-store settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    5000
}

/// `[tavily]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TavilyConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Search endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
        }
    }
}

fn default_api_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_endpoint() -> String {
    "https://api.tavily.com/search".into()
}

/// `[research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Depth used when a request omits it.
    #[serde(default = "default_depth")]
    pub default_depth: u8,

    /// Maximum sources included in a response envelope.
    #[serde(default = "default_max_urls")]
    pub max_urls: usize,

    /// Cache entry lifetime in minutes (0 disables caching).
    #[serde(default = "default_cache_expiry")]
    pub cache_expiry_minutes: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            max_urls: default_max_urls(),
            cache_expiry_minutes: default_cache_expiry(),
        }
    }
}

fn default_depth() -> u8 {
    3
}
fn default_max_urls() -> usize {
    5
}
fn default_cache_expiry() -> u64 {
    60
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: "local" (JSON files) or "database" (embedded libSQL).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory for stored results (and the database file).
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

fn default_backend() -> String {
    "local".into()
}
fn default_storage_path() -> String {
    "data".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.webscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| WebScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.webscout/webscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WebScoutError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| WebScoutError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WebScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WebScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WebScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the Tavily API key env var is set and the key looks valid.
/// Returns the key on success.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.tavily.api_key_env;
    match std::env::var(var_name) {
        Ok(key) if !key.is_empty() => {
            check_api_key_format(&key)?;
            Ok(key)
        }
        _ => Err(WebScoutError::config(format!(
            "Tavily API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://app.tavily.com"
        ))),
    }
}

/// Validate the key's format without touching the environment.
pub fn check_api_key_format(key: &str) -> Result<()> {
    if !key.starts_with(API_KEY_PREFIX) {
        return Err(WebScoutError::config(format!(
            "invalid Tavily API key format: key should start with '{API_KEY_PREFIX}'"
        )));
    }
    Ok(())
}
