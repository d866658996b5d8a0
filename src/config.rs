use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::sdk::DEFAULT_RELEASE_CHANNEL_URL;

/// Optional configuration file (TOML)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InvalidateConfig {
    #[serde(default)]
    pub sdk: SdkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// gcloud provisioning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Release channel serving `components-2.json` and `downloads/`
    #[serde(default = "default_release_channel_url")]
    pub release_channel_url: String,

    /// Tool cache root, used when RUNNER_TOOL_CACHE is not set
    #[serde(default)]
    pub tool_cache_dir: Option<String>,

    /// Version used when the gcloud_version input is not set
    #[serde(default)]
    pub default_version: Option<String>,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            release_channel_url: default_release_channel_url(),
            tool_cache_dir: None,
            default_version: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default)]
    pub log_format: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: None,
        }
    }
}

fn default_release_channel_url() -> String {
    DEFAULT_RELEASE_CHANNEL_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl InvalidateConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: InvalidateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.sdk.release_channel_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!(
                "sdk.release_channel_url must start with http:// or https://: {}",
                url
            );
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.observability.log_level.as_str())
        {
            anyhow::bail!("observability.log_level must be one of: trace, debug, info, warn, error");
        }

        if let Some(format) = &self.observability.log_format {
            if !["pretty", "compact", "json"].contains(&format.as_str()) {
                anyhow::bail!("observability.log_format must be one of: pretty, compact, json");
            }
        }

        Ok(())
    }
}
