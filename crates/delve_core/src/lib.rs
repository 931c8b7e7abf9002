//! # DELVE Core
//!
//! Entity store and spatial index for a turn-based grid simulation:
//! - Generational entity ids that never alias after destruction
//! - Dense per-kind component tables with a bitmask per entity
//! - A location index that always agrees with Position components
//!
//! ## Architecture Rules
//!
//! 1. **Position is never edited in place** - moves go through the store
//! 2. **Queries hold no state** - they are evaluated on every call
//! 3. **The index is derived** - it can always be rebuilt from Positions
//!
//! ## Example
//!
//! ```rust,ignore
//! use delve_core::{EntityStore, Position, Blocking, LocationKey};
//!
//! let mut store = EntityStore::new();
//! let wall = store.create();
//! store.attach(wall, Position::new(0, 0, -1))?;
//! store.attach(wall, Blocking)?;
//! assert!(store.any_at::<Blocking>(LocationKey::new(0, 0, -1)));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ecs;
pub mod effect;
pub mod error;
pub mod spatial;

pub use ecs::{
    ActiveEffects, AiTag, Appearance, Blocking, Component, ComponentKind, ComponentMask,
    ComponentStorage, ComponentTables, Consumable, Dead, Defense, Description, Entity, EntityId,
    EntitySnapshot, EntityStore, Health, Inventory, Item, Mutable, Opaque, Paralyzed, Player,
    Position, Power, Query, Revealed, StoreSnapshot, Terrain, TileKind, Visible,
};
pub use effect::{ActiveEffect, EffectEvent, EffectMode, EffectSpec, StatKind, TagKind, Targeting};
pub use error::{IndexViolation, LocationParseError, StoreError, StoreResult};
pub use spatial::{LocationKey, SpatialIndex};
