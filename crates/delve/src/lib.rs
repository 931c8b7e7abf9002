//! # DELVE
//!
//! Turn-based grid simulation built on [`delve_core`].
//!
//! ## Turn Flow
//!
//! ```text
//! ┌───────────┐   Intent    ┌────────────────┐   spent   ┌───────────────────┐
//! │   Host    │ ──────────> │ TurnScheduler  │ ────────> │  World resolution │
//! │ (input,   │             │  player action │           │  AI -> effects    │
//! │  render)  │ <────────── │                │ <──────── │  -> visibility    │
//! └───────────┘  Outcome,   └────────────────┘           └───────────────────┘
//!                GameEvents
//! ```
//!
//! ## Modules
//!
//! - `fov`: recursive shadowcasting over an opacity snapshot
//! - `path`: A* over an occupancy snapshot
//! - `effects`: timed modifications and tags
//! - `combat`: damage, healing and death
//! - `ai`: monster turns
//! - `turn`: the scheduler state machine
//! - `world`: entity store, levels, message log and event bus together
//!
//! ## Example
//!
//! ```rust,ignore
//! use delve::{AsciiLevels, GameConfig, GameWorld, Intent, TurnScheduler};
//!
//! let levels = AsciiLevels::new(["#####\n#<.>#\n#####"]);
//! let mut world = GameWorld::new(GameConfig::default(), levels)?;
//! let mut turns = TurnScheduler::new();
//! turns.submit(&mut world, Intent::Move { dx: 1, dy: 0 })?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ai;
pub mod combat;
pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod fov;
pub mod level;
pub mod messages;
pub mod path;
pub mod prefabs;
pub mod spawn;
pub mod turn;
pub mod world;

pub use delve_core as core;

pub use ai::AiAction;
pub use config::{AiConfig, GameConfig, SpawnConfig};
pub use error::{AiError, EffectError, SimError, SimResult, TurnError};
pub use events::{EventBus, EventReceiver, EventSender, GameEvent};
pub use level::{AsciiLevels, LevelBounds, LevelData, LevelInfo, LevelSource, NoLevels};
pub use messages::MessageLog;
pub use path::{find_path, OccupancyGrid};
pub use prefabs::ItemKind;
pub use turn::{Intent, MetaCommand, TurnOutcome, TurnScheduler, TurnState};
pub use world::{GameWorld, WorldSnapshot, FIRST_LEVEL};
