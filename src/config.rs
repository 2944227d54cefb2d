//! Configuration file handling.
//!
//! Everything is optional: a missing file, or a file that only sets a few
//! keys, falls back to the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::autocomplete::{AutocompleteSettings, DEFAULT_SUGGESTIONS, DEFAULT_TRIGGER, ESCAPE_CHAR};
use crate::caret::{CaretOffset, LocatorChoice};
use crate::document::OBJECT_REPLACEMENT;

const APP_DIR: &str = "slashpad";
const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid trigger character {0:?}")]
    InvalidTrigger(char),

    #[error("The suggestion list must not be empty")]
    NoSuggestions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Character that starts a query
    pub trigger: char,

    /// Candidates offered in the popup, in display order
    pub suggestions: Vec<String>,

    /// How the popup finds the caret on screen
    pub caret_locator: LocatorChoice,

    pub timing: TimingConfig,

    pub popup: PopupConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub measure_delay_ms: u64,
    pub blur_delay_ms: u64,
    pub activation_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupConfig {
    /// Columns added to the caret position
    pub offset_x: i32,

    /// Lines added to the caret position
    pub offset_y: i32,

    /// Suggestions shown before the list scrolls
    pub max_visible: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            caret_locator: LocatorChoice::default(),
            timing: TimingConfig::default(),
            popup: PopupConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            measure_delay_ms: 0,
            blur_delay_ms: 100,
            activation_delay_ms: 50,
        }
    }
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 1,
            max_visible: 6,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/slashpad/config.toml`, when the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// An explicit path must exist; the default location is only used when
    /// a file is there. Returns the path actually loaded.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                let config = Self::from_file(&path)?;
                Ok((config, Some(path)))
            }
            _ => {
                debug!("no config file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let trigger = self.trigger;
        if trigger.is_whitespace()
            || trigger.is_control()
            || trigger == ESCAPE_CHAR
            || trigger == OBJECT_REPLACEMENT
        {
            return Err(ConfigError::InvalidTrigger(trigger));
        }
        if self.suggestions.is_empty() {
            return Err(ConfigError::NoSuggestions);
        }
        Ok(())
    }

    pub fn autocomplete_settings(&self) -> AutocompleteSettings {
        AutocompleteSettings::from(self)
    }
}

impl From<&Config> for AutocompleteSettings {
    fn from(config: &Config) -> Self {
        Self {
            trigger: config.trigger,
            candidates: config.suggestions.clone(),
            measure_delay: Duration::from_millis(config.timing.measure_delay_ms),
            blur_delay: Duration::from_millis(config.timing.blur_delay_ms),
            activation_delay: Duration::from_millis(config.timing.activation_delay_ms),
            anchor_offset: CaretOffset::new(config.popup.offset_y, config.popup.offset_x),
        }
    }
}
