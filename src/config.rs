//! Configuration: CLI arguments and the indicator settings store

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
    time::Duration,
};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::{IndicatorError, IndicatorResult},
    state::{Category, IntegrationId},
};

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "launchpad-indicator")]
#[command(about = "A focus-aware launchpad status indicator")]
#[command(version)]
pub struct Config {
    /// Port to bind the host surface to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Settings file (TOML). Created on first persisted change.
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Override the polling interval in minutes
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Start with polling disabled
    #[arg(long)]
    pub no_polling: bool,

    /// Integrations to mark as connected on startup
    #[arg(long, value_delimiter = ',')]
    pub connect: Vec<IntegrationId>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Apply CLI overrides on top of loaded settings
    pub fn apply_overrides(&self, settings: &mut IndicatorSettings) {
        if let Some(minutes) = self.interval {
            settings.polling.set_interval_minutes(minutes);
        }
        if self.no_polling {
            settings.polling.enabled = false;
        }
    }
}

/// How the indicator text labels the top category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelMode {
    /// Show the top item itself
    #[default]
    Item,
    /// Show one count per non-empty group
    Counts,
}

/// Which icon leads the indicator text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconMode {
    #[default]
    Default,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PollingSettings {
    pub enabled: bool,
    pub interval_minutes: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: 30,
        }
    }
}

/// Longest accepted polling interval: one week
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

impl PollingSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.min(MAX_INTERVAL_MINUTES) * 60)
    }

    /// Set the interval, clamping it to [`MAX_INTERVAL_MINUTES`]
    pub fn set_interval_minutes(&mut self, minutes: u64) {
        if minutes > MAX_INTERVAL_MINUTES {
            warn!(
                "Polling interval of {} minutes is too long, using {}",
                minutes, MAX_INTERVAL_MINUTES
            );
        }
        self.interval_minutes = minutes.min(MAX_INTERVAL_MINUTES);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnnotationSettings {
    pub enabled: bool,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Indicator settings as stored on disk.
///
/// Mode and group values are kept as raw strings so an unrecognized value
/// degrades to the default instead of rejecting the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IndicatorSettings {
    pub enabled: bool,
    pub use_colors: bool,
    pub icon: String,
    pub label: String,
    pub groups: Vec<String>,
    pub polling: PollingSettings,
    pub annotations: AnnotationSettings,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            use_colors: true,
            icon: "default".to_string(),
            label: "item".to_string(),
            groups: vec![
                "mergeable".to_string(),
                "blocked".to_string(),
                "follow-up".to_string(),
                "needs-review".to_string(),
            ],
            polling: PollingSettings::default(),
            annotations: AnnotationSettings::default(),
        }
    }
}

impl IndicatorSettings {
    pub fn label_mode(&self) -> LabelMode {
        match self.label.as_str() {
            "item" => LabelMode::Item,
            "counts" => LabelMode::Counts,
            other => {
                debug!("Unrecognized label mode {:?}, using default", other);
                LabelMode::default()
            }
        }
    }

    pub fn icon_mode(&self) -> IconMode {
        match self.icon.as_str() {
            "default" => IconMode::Default,
            "group" => IconMode::Group,
            other => {
                debug!("Unrecognized icon mode {:?}, using default", other);
                IconMode::default()
            }
        }
    }

    /// Configured attention groups in priority order.
    ///
    /// Unknown names and non-attention categories are dropped, duplicates
    /// keep their first position, and an empty result falls back to the
    /// default order.
    pub fn group_order(&self) -> Vec<Category> {
        let mut order: Vec<Category> = Vec::new();
        for name in &self.groups {
            let parsed = serde_json::from_value::<Category>(serde_json::Value::String(name.clone()));
            match parsed {
                Ok(category) if category.is_attention() && !order.contains(&category) => {
                    order.push(category)
                }
                Ok(_) => {}
                Err(_) => debug!("Ignoring unknown indicator group {:?}", name),
            }
        }
        if order.is_empty() {
            order = Category::ATTENTION.to_vec();
        }
        order
    }

    /// Whether the change from `self` to `other` requires recomputing state
    pub fn affects_polling(&self, other: &IndicatorSettings) -> bool {
        self.enabled != other.enabled || self.polling != other.polling
    }

    /// Polling is on only while the indicator itself is shown
    pub fn polling_active(&self) -> bool {
        self.enabled && self.polling.enabled
    }

    /// Bring out-of-range values back into range
    pub fn normalize(&mut self) {
        let minutes = self.polling.interval_minutes;
        self.polling.set_interval_minutes(minutes);
    }
}

/// Partial update of [`IndicatorSettings`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub polling_enabled: Option<bool>,
    pub interval_minutes: Option<u64>,
    pub use_colors: Option<bool>,
    pub icon: Option<String>,
    pub label: Option<String>,
    pub groups: Option<Vec<String>>,
    pub annotations_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut IndicatorSettings) {
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        if let Some(enabled) = self.polling_enabled {
            settings.polling.enabled = enabled;
        }
        if let Some(minutes) = self.interval_minutes {
            settings.polling.set_interval_minutes(minutes);
        }
        if let Some(use_colors) = self.use_colors {
            settings.use_colors = use_colors;
        }
        if let Some(icon) = self.icon {
            settings.icon = icon;
        }
        if let Some(label) = self.label {
            settings.label = label;
        }
        if let Some(groups) = self.groups {
            settings.groups = groups;
        }
        if let Some(enabled) = self.annotations_enabled {
            settings.annotations.enabled = enabled;
        }
    }
}

/// Settings holder that publishes every change to its subscribers and
/// writes it back to disk when a path is configured
#[derive(Debug)]
pub struct ConfigStore {
    tx: watch::Sender<IndicatorSettings>,
    path: Option<PathBuf>,
    // Serializes read-modify-persist-publish across updaters
    write_lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(mut settings: IndicatorSettings, path: Option<PathBuf>) -> Self {
        settings.normalize();
        let (tx, _) = watch::channel(settings);
        Self {
            tx,
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Load settings from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> IndicatorResult<IndicatorSettings> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                return Ok(IndicatorSettings::default());
            }
            Err(source) => {
                return Err(IndicatorError::SettingsRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut settings: IndicatorSettings =
            toml::from_str(&raw).map_err(|source| IndicatorError::SettingsParse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.normalize();
        Ok(settings)
    }

    pub fn current(&self) -> IndicatorSettings {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IndicatorSettings> {
        self.tx.subscribe()
    }

    /// Apply an update, persist it, then notify subscribers.
    ///
    /// A failed write leaves the current settings untouched and nobody is
    /// notified.
    pub fn update<F>(&self, updater: F) -> IndicatorResult<IndicatorSettings>
    where
        F: FnOnce(&mut IndicatorSettings),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| IndicatorError::Lock("settings"))?;

        let mut next = self.current();
        updater(&mut next);
        next.normalize();

        if *self.tx.borrow() == next {
            debug!("Settings update left values unchanged");
            return Ok(next);
        }

        self.persist(&next)?;
        self.tx.send_replace(next.clone());
        info!("Indicator settings changed");
        Ok(next)
    }

    fn persist(&self, settings: &IndicatorSettings) -> IndicatorResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let serialized = toml::to_string_pretty(settings).map_err(|e| IndicatorError::SettingsWrite {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(path, serialized).map_err(|e| {
            warn!("Failed to persist settings to {}: {}", path.display(), e);
            IndicatorError::SettingsWrite {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;

        debug!("Settings persisted to {}", path.display());
        Ok(())
    }
}
