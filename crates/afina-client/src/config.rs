use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    /// Per-request timeout. Uploads of large collections may need more.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub home: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub backend: Option<BackendConfig>,
    pub storage: Option<StorageConfig>,
}

impl Config {
    /// Read `config/afina.toml` (or `AFINA_CONFIG`). A missing file yields defaults.
    pub fn load() -> anyhow::Result<(Self, PathBuf)> {
        let cfg_path = env::var("AFINA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/afina.toml"));
        let mut cfg: Config = if cfg_path.exists() {
            let text = fs::read_to_string(&cfg_path)
                .with_context(|| format!("reading {}", cfg_path.display()))?;
            toml::from_str(&text).with_context(|| format!("parsing {}", cfg_path.display()))?
        } else {
            Config::default()
        };

        // Env overrides (minimal): AFINA_BACKEND_URL, AFINA_HOME
        if let Ok(url) = env::var("AFINA_BACKEND_URL") {
            cfg.backend.get_or_insert(BackendConfig { base_url: None, timeout_secs: None }).base_url = Some(url);
        }
        if let Ok(home) = env::var("AFINA_HOME") {
            cfg.storage.get_or_insert(StorageConfig { home: None }).home = Some(home);
        }

        Ok((cfg, cfg_path))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            backend: Some(BackendConfig { base_url: Some(base_url.into()), timeout_secs: None }),
            storage: None,
        }
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.storage = Some(StorageConfig { home: Some(home.into()) });
        self
    }

    pub fn base_url(&self) -> String {
        self.backend
            .as_ref()
            .and_then(|b| b.base_url.as_ref())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn timeout(&self) -> Duration {
        let secs = self.backend.as_ref().and_then(|b| b.timeout_secs).unwrap_or(120);
        Duration::from_secs(secs)
    }

    pub fn home_dir(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.home.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./storage"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.home_dir().join("logs").join("afina.log")
    }
}
