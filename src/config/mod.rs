use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::pomodoro::{Durations, Mode, ModeMap};

pub const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:8765";

/// Per-mode durations in seconds. Missing entries keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationConfig {
    pub focus: u64,
    pub short_break: u64,
    pub long_break: u64,
}

impl Default for DurationConfig {
    fn default() -> Self {
        Self {
            focus: Mode::Focus.default_duration(),
            short_break: Mode::ShortBreak.default_duration(),
            long_break: Mode::LongBreak.default_duration(),
        }
    }
}

impl From<DurationConfig> for Durations {
    fn from(config: DurationConfig) -> Self {
        ModeMap {
            focus: config.focus,
            short_break: config.short_break,
            long_break: config.long_break,
        }
    }
}

/// Settings read once at startup from `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub durations: DurationConfig,
    pub notifications: bool,
    pub relay_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            durations: DurationConfig::default(),
            notifications: true,
            relay_addr: DEFAULT_RELAY_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// `$HOME/.config/focus_timer/config.yaml`
    pub fn default_path() -> PathBuf {
        home_dir().join(".config").join(crate::APP_NAME).join("config.yaml")
    }

    /// Load the config file, falling back to defaults when it doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml_ng::from_str(contents).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (mode, seconds) in self.durations().iter() {
            if *seconds == 0 {
                bail!("{} duration must be at least one second", mode.label());
            }
        }
        if self.relay_addr.trim().is_empty() {
            bail!("relay_addr must not be empty");
        }
        Ok(())
    }

    pub fn durations(&self) -> Durations {
        self.durations.into()
    }
}

pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `$HOME/.local/share/focus_timer`
pub fn default_log_dir() -> PathBuf {
    home_dir().join(".local").join("share").join(crate::APP_NAME)
}
