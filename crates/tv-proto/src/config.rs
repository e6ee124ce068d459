use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use super::platform;
use super::resolver::DEFAULT_EMBED_BASE;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where the listing document comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// `http(s)://` URL, `file://` URL, or a filesystem path.
    #[serde(default = "default_catalog_source")]
    pub source: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerBackend {
    #[default]
    Mpv,
    /// Headless: log the embed URL instead of playing it.
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_embed_base")]
    pub embed_base: String,
    #[serde(default)]
    pub backend: PlayerBackend,
    /// Extra arguments appended to the mpv command line.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: default_catalog_source(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Lower bound for the HTTP fetch timeout; zero would fail every request.
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

impl CatalogConfig {
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS {
            warn!(
                "config: catalog.request_timeout_secs = {} is too small, using {}s",
                self.request_timeout_secs, MIN_REQUEST_TIMEOUT_SECS
            );
            return Duration::from_secs(MIN_REQUEST_TIMEOUT_SECS);
        }
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            embed_base: default_embed_base(),
            backend: PlayerBackend::default(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_catalog_source() -> String {
    let in_config = platform::config_dir().join("channels.json");
    if in_config.exists() {
        return in_config.display().to_string();
    }
    "channels.json".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_embed_base() -> String {
    DEFAULT_EMBED_BASE.to_string()
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
