use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct SaachiConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BackendConfig {
    /// `"gemini"` or `"heuristic"`.
    pub provider: String,
    pub model: String,
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "http".into(),
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".into(),
            model: "gemini-2.5-flash".into(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: None,
            temperature: 0.7,
        }
    }
}

impl BackendConfig {
    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Returns `~/.saachi/`, or `./.saachi` when no home directory is known.
pub fn default_saachi_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".saachi")
}

/// Returns the default config file path: `~/.saachi/config.toml`
pub fn default_config_path() -> PathBuf {
    default_saachi_dir().join("config.toml")
}

impl SaachiConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            SaachiConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (GOOGLE_API_KEY, SAACHI_PROVIDER,
    /// SAACHI_MODEL, SAACHI_HOST, SAACHI_PORT, SAACHI_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GOOGLE_API_KEY") {
            self.backend.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("SAACHI_PROVIDER") {
            self.backend.provider = val;
        }
        if let Ok(val) = std::env::var("SAACHI_MODEL") {
            self.backend.model = val;
        }
        if let Ok(val) = std::env::var("SAACHI_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("SAACHI_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid SAACHI_PORT"),
            }
        }
        if let Ok(val) = std::env::var("SAACHI_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// `host:port` the HTTP transport binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
