//! # Simulation Error Types
//!
//! All errors that can occur while running the simulation.
//!
//! Expected empty results (no path, no target in view, nothing to pick up)
//! are ordinary values, never errors.

use std::path::PathBuf;

use delve_core::{EntityId, StatKind, StoreError};
use thiserror::Error;

/// Errors that can occur in the simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// The world has no living player entity.
    #[error("no player entity in the world")]
    NoPlayer,

    /// The level was never loaded and the level source could not supply it.
    #[error("level {0} is not available")]
    MissingLevel(i32),

    /// The level has no open cell to place an entity on.
    #[error("level {0} has no open cell")]
    NoOpenCell(i32),

    /// ASCII level data contained an unknown glyph.
    #[error("unknown tile {glyph:?} at row {row}, column {column}")]
    BadTile {
        /// Offending character.
        glyph: char,
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        column: usize,
    },

    /// An entity store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Rejections returned by the turn scheduler.
#[derive(Error, Debug)]
pub enum TurnError {
    /// The player is dead; only `LoadGame` and `NewGame` are accepted.
    #[error("the game is over")]
    GameOver,

    /// Resolving the intent failed.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl From<StoreError> for TurnError {
    fn from(err: StoreError) -> Self {
        Self::Sim(SimError::Store(err))
    }
}

/// Per-entity failure inside the effect engine. Logged and skipped.
#[derive(Error, Debug)]
pub enum EffectError {
    /// The target lacks the component the effect modifies.
    #[error("entity {entity} has no {stat:?} to modify")]
    MissingStat {
        /// Target entity.
        entity: EntityId,
        /// Stat the effect names.
        stat: StatKind,
    },

    /// Store failure while applying.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl From<StoreError> for EffectError {
    fn from(err: StoreError) -> Self {
        Self::Sim(SimError::Store(err))
    }
}

/// Per-actor failure inside monster AI. Logged and skipped.
#[derive(Error, Debug)]
pub enum AiError {
    /// The actor has an AI tag but no position.
    #[error("actor {0} has no position")]
    NoPosition(EntityId),

    /// The actor stands on a level with no recorded bounds.
    #[error("actor {actor} is on unknown level {level}")]
    UnknownLevel {
        /// Actor entity.
        actor: EntityId,
        /// Its level.
        level: i32,
    },

    /// Resolving the step failed.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl From<StoreError> for AiError {
    fn from(err: StoreError) -> Self {
        Self::Sim(SimError::Store(err))
    }
}
