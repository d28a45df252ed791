use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::proxy::ProxyConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SOCKS5 proxy endpoint used when proxy routing is enabled.
    pub proxy: ProxyConfig,

    /// Language candidates tried in order. "auto" resolves against the
    /// transcripts actually available for the video.
    pub languages: Vec<String>,

    /// Result cache settings.
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Write each result document to the cache directory.
    pub enabled: bool,

    /// Cache directory, relative to the working directory unless absolute.
    pub dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: ProxyConfig::default(),
            languages: ["en", "en-US", "en-GB", "ko", "auto"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache: CacheConfig {
                enabled: true,
                dir: PathBuf::from(crate::cache::DEFAULT_CACHE_DIR),
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            let config: Config =
                serde_yaml::from_str(&content).context("Failed to parse config file")?;

            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("transcript-fetcher").join("config.yaml"))
    }
}
