//! statsq configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::render::WidgetConfig;
use crate::scheduler::SchedulerConfig;

/// Main statsq configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Admission control
    pub scheduler: SchedulerConfig,

    /// Stats server connection
    pub transport: TransportConfig,

    /// Widgets to draw, in submission order
    pub widgets: Vec<WidgetConfig>,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.capacity == 0 {
            return Err(eyre::eyre!("scheduler capacity must be at least 1"));
        }
        if !self.transport.base_url.starts_with("http://") && !self.transport.base_url.starts_with("https://") {
            return Err(eyre::eyre!(
                "transport base-url must start with http:// or https://, got '{}'",
                self.transport.base_url
            ));
        }
        for (i, widget) in self.widgets.iter().enumerate() {
            if widget.container_id.as_deref().unwrap_or("").is_empty() {
                return Err(eyre::eyre!("widget #{} ({}) has no container-id", i, widget.kind));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .statsq.yml
        let local_config = PathBuf::from(".statsq.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/statsq/statsq.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("statsq").join("statsq.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Stats server connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Prepended to relative widget urls
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            timeout_ms: 30_000,
        }
    }
}
