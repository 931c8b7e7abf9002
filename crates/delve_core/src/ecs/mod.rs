//! # Entity Component System
//!
//! A generational entity store with a closed set of component kinds.
//!
//! ## Design Philosophy
//!
//! - Components are stored in dense arrays indexed by entity slot
//! - Entity IDs are slot indices with generation counters
//! - Presence is a per-entity bitmask, so queries are mask tests
//! - Position changes go through the store, which owns the spatial index

mod component;
mod entity;
mod query;
mod snapshot;
mod storage;
mod store;

pub use component::{
    ActiveEffects, AiTag, Appearance, Blocking, Component, ComponentKind, ComponentMask,
    ComponentTables, Consumable, Dead, Defense, Description, Health, Inventory, Item, Mutable,
    Opaque, Paralyzed, Player, Position, Power, Revealed, Terrain, TileKind, Visible,
};
pub use entity::{Entity, EntityId};
pub use query::Query;
pub use snapshot::{EntitySnapshot, StoreSnapshot};
pub use storage::ComponentStorage;
pub use store::EntityStore;
