use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default bytes per part (10 MiB).
pub const DEFAULT_PART_SIZE: u64 = 10 * 1024 * 1024;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per transport call (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/rmt/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmtConfig {
    /// Bytes per part for new transfers.
    pub part_size: u64,
    /// Parts transferred concurrently per transaction.
    pub max_concurrent_parts: usize,
    /// Root directory of the local object store, used when `--store` is not given.
    #[serde(default)]
    pub store_root: Option<PathBuf>,
    /// Directory for checkpoint files. When unset, a checkpoint sits next to its
    /// local file as `<file>.cpt`.
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for RmtConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_concurrent_parts: 4,
            store_root: None,
            checkpoint_dir: None,
            retry: None,
        }
    }
}

impl RmtConfig {
    /// Retry section, or the defaults when it is absent.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rmt")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<RmtConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = RmtConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: RmtConfig = toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
