//! # Game Configuration
//!
//! Tunables loaded once at startup from TOML. Every field has a default, so
//! an empty file is a valid configuration.
//!
//! ```toml
//! seed = 42
//! fov_radius = 8
//!
//! [spawn]
//! monsters_per_level = 4
//! items_per_level = 3
//!
//! [ai]
//! activate_only_visible = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Default field-of-view radius in tiles.
pub const DEFAULT_FOV_RADIUS: i32 = 8;

/// Default number of retained log messages.
pub const DEFAULT_MESSAGE_LOG_CAPACITY: usize = 100;

/// Default bound of the event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for every random decision the simulation makes.
    pub seed: u64,
    /// Field-of-view radius; 0 sees only the player's own cell.
    pub fov_radius: i32,
    /// Messages kept before the oldest is dropped.
    pub message_log_capacity: usize,
    /// Events buffered before new ones are dropped.
    pub event_capacity: usize,
    /// Population of freshly generated levels.
    pub spawn: SpawnConfig,
    /// Monster activation rules.
    pub ai: AiConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            fov_radius: DEFAULT_FOV_RADIUS,
            message_log_capacity: DEFAULT_MESSAGE_LOG_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            spawn: SpawnConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

/// Level population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Monsters placed on each new level.
    pub monsters_per_level: usize,
    /// Items placed on each new level.
    pub items_per_level: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            monsters_per_level: 4,
            items_per_level: 3,
        }
    }
}

/// Monster activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Only monsters the player can currently see take turns.
    pub activate_only_visible: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            activate_only_visible: true,
        }
    }
}

impl GameConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] if the text is not valid TOML for this schema.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`SimError::Io`] if the file cannot be read, [`SimError::Config`] if
    /// it does not parse.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
