use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::PathBuf,
    sync::{Arc, OnceLock},
};

pub const DEFAULT_BASE_URL: &str = "https://api.stormglass.io";
pub const API_KEY_ENV: &str = "STORMGLASS_API_KEY";
pub const BASE_URL_ENV: &str = "STORMGLASS_BASE_URL";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.stormglass.io"
/// ```
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Overrides [`DEFAULT_BASE_URL`], e.g. for a local mock server.
    pub base_url: Option<String>,
}

impl Config {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self { api_key: Some(api_key.into()), base_url: None }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// [`Config::load`], then `STORMGLASS_API_KEY` / `STORMGLASS_BASE_URL` on top.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "stormglass", "stormglass-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// Returns the API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No Storm Glass API key configured.\n\
                 Hint: run `stormglass configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("base_url", &self.base_url)
            .finish()
    }
}

const REDACTED: &str = "<redacted>";

/// Where the client reads "the current API key" from, once per call.
pub trait ApiKeySource: Send + Sync + fmt::Debug {
    fn api_key(&self) -> Option<String>;

    /// Endpoint override, also read per call. `None` leaves the client's default.
    fn base_url(&self) -> Option<String> {
        None
    }
}

impl ApiKeySource for Config {
    fn api_key(&self) -> Option<String> {
        Config::api_key(self).map(str::to_owned)
    }

    fn base_url(&self) -> Option<String> {
        self.base_url.clone()
    }
}

impl<T: ApiKeySource + ?Sized> ApiKeySource for Arc<T> {
    fn api_key(&self) -> Option<String> {
        (**self).api_key()
    }

    fn base_url(&self) -> Option<String> {
        (**self).base_url()
    }
}

#[derive(Clone)]
pub struct StaticApiKey(pub String);

impl fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StaticApiKey").field(&REDACTED).finish()
    }
}

impl ApiKeySource for StaticApiKey {
    fn api_key(&self) -> Option<String> {
        Some(self.0.clone()).filter(|k| !k.trim().is_empty())
    }
}

static SHARED: OnceLock<Config> = OnceLock::new();

/// Install the process-wide configuration. Call once at startup.
pub fn configure(config: Config) -> Result<()> {
    SHARED.set(config).map_err(|_| {
        anyhow!("Storm Glass is already configured. Only call `configure` once per process.")
    })?;
    tracing::info!("configured process-wide Storm Glass settings");
    Ok(())
}

pub fn shared_config() -> Option<&'static Config> {
    SHARED.get()
}

/// Reads the key installed with [`configure`] at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedConfig;

impl ApiKeySource for SharedConfig {
    fn api_key(&self) -> Option<String> {
        shared_config().and_then(|cfg| cfg.api_key()).map(str::to_owned)
    }

    fn base_url(&self) -> Option<String> {
        shared_config().and_then(|cfg| cfg.base_url.clone())
    }
}
