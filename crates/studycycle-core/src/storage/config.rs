//! TOML-based application configuration.
//!
//! Stores the cycle durations, named study presets, theme,
//! notification preference and the settle-delay knob at
//! `~/.config/studycycle/config.toml`. Load failures degrade to
//! defaults with a warning; the timer never crashes over a bad config
//! file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::{CycleConfig, DEFAULT_SETTLE_MS, MAX_PHASE_SECS};

/// Persisted UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ConfigError::invalid(
                "theme",
                format!("expected 'light' or 'dark', got '{other}'"),
            )),
        }
    }
}

/// A named study duration the user can apply to the cycle in one
/// step. Built-in presets ship with the app and cannot be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub study_secs: u64,
    #[serde(default)]
    pub builtin: bool,
}

fn default_presets() -> Vec<Preset> {
    [("pomodoro", 25), ("focus", 50), ("deep-work", 90)]
        .into_iter()
        .map(|(name, minutes)| Preset {
            name: name.to_string(),
            study_secs: minutes * 60,
            builtin: true,
        })
        .collect()
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studycycle/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default = "default_presets")]
    pub presets: Vec<Preset>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    /// Feedback pause between automatic phase transitions, in
    /// milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle: CycleConfig::default(),
            presets: default_presets(),
            theme: Theme::default(),
            notifications: NotificationsConfig::default(),
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl Config {
    fn path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk. A missing file yields the default config and
    /// writes it out.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if
    /// the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/studycycle"),
            message: e.to_string(),
        })?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, degrading to defaults on any failure.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("falling back to default config: {e}");
            Self::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("~/.config/studycycle"),
            message: e.to_string(),
        })?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Validate and apply new cycle durations, persisting on success.
    /// The caller is responsible for resetting the scheduler.
    ///
    /// # Errors
    ///
    /// Returns the validation error without touching the stored config.
    pub fn apply_cycle(&mut self, cycle: CycleConfig) -> Result<(), ConfigError> {
        cycle.validate()?;
        self.cycle = cycle;
        self.save()
    }

    /// Add a user preset and persist. Names must be unique.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or duplicate name, an
    /// out-of-range duration, or a save failure.
    pub fn add_preset(&mut self, name: &str, study_secs: u64) -> Result<(), ConfigError> {
        self.push_preset(name, study_secs)?;
        self.save()
    }

    fn push_preset(&mut self, name: &str, study_secs: u64) -> Result<(), ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::invalid("preset", "name must not be empty"));
        }
        if self.presets.iter().any(|p| p.name == name) {
            return Err(ConfigError::invalid(
                "preset",
                format!("a preset named '{name}' already exists"),
            ));
        }
        if study_secs == 0 || study_secs > MAX_PHASE_SECS {
            return Err(ConfigError::invalid(
                "preset",
                format!("study duration must be between 1 and {MAX_PHASE_SECS} seconds"),
            ));
        }
        self.presets.push(Preset {
            name: name.to_string(),
            study_secs,
            builtin: false,
        });
        Ok(())
    }

    /// Remove a user preset and persist. Returns whether anything was
    /// removed; an unknown name is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error for a built-in preset or a save failure.
    pub fn remove_preset(&mut self, name: &str) -> Result<bool, ConfigError> {
        let removed = self.drop_preset(name)?;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    fn drop_preset(&mut self, name: &str) -> Result<bool, ConfigError> {
        match self.presets.iter().position(|p| p.name == name) {
            Some(i) if self.presets[i].builtin => Err(ConfigError::invalid(
                "preset",
                format!("'{name}' is a built-in preset and cannot be removed"),
            )),
            Some(i) => {
                self.presets.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply a preset's study duration to the cycle and persist,
    /// returning the new cycle. The caller is responsible for
    /// resetting the scheduler.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown preset name or a save failure.
    pub fn apply_preset(&mut self, name: &str) -> Result<CycleConfig, ConfigError> {
        let cycle = self.select_preset(name)?;
        self.save()?;
        Ok(cycle)
    }

    fn select_preset(&mut self, name: &str) -> Result<CycleConfig, ConfigError> {
        let preset = self
            .presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::invalid("preset", format!("no preset named '{name}'")))?;
        let mut cycle = self.cycle;
        cycle.study_secs = preset.study_secs;
        cycle.validate()?;
        self.cycle = cycle;
        Ok(cycle)
    }

    /// Get a config value as a string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "theme" => Some(self.theme.to_string()),
            "settle_ms" => Some(self.settle_ms.to_string()),
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            "cycle.ready_secs" => Some(self.cycle.ready_secs.to_string()),
            "cycle.study_secs" => Some(self.cycle.study_secs.to_string()),
            "cycle.rest_secs" => Some(self.cycle.rest_secs.to_string()),
            "cycle.total_sets" => Some(self.cycle.total_sets.to_string()),
            _ => None,
        }
    }

    /// Set a config value by key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown keys, unparsable values, values
    /// that fail cycle validation, or save failures.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply_key(key, value)?;
        self.save()
    }

    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "theme" => {
                self.theme = value.parse()?;
            }
            "settle_ms" => {
                self.settle_ms = parse_number(key, value)?;
            }
            "notifications.enabled" => {
                self.notifications.enabled = value
                    .parse()
                    .map_err(|_| ConfigError::invalid(key, "expected true or false"))?;
            }
            "cycle.ready_secs" | "cycle.study_secs" | "cycle.rest_secs" | "cycle.total_sets" => {
                let mut cycle = self.cycle;
                match key {
                    "cycle.ready_secs" => cycle.ready_secs = parse_number(key, value)?,
                    "cycle.study_secs" => cycle.study_secs = parse_number(key, value)?,
                    "cycle.rest_secs" => cycle.rest_secs = parse_number(key, value)?,
                    _ => cycle.total_sets = parse_number(key, value)?,
                }
                cycle.validate()?;
                self.cycle = cycle;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}' as a number")))
}
