//! # Store Snapshots
//!
//! Captures every live entity with its components so a store can be
//! restored with identical ids. The spatial index is not captured; it is
//! rebuilt from Position components on restore.

use serde::{Deserialize, Serialize};

use super::component::{
    ActiveEffects, AiTag, Appearance, Blocking, Component, ComponentKind, Consumable, Dead,
    Defense, Description, Health, Inventory, Item, Opaque, Paralyzed, Player, Position, Power,
    Revealed, Terrain, Visible,
};
use super::entity::EntityId;
use super::store::EntityStore;
use crate::error::StoreResult;

/// One entity and its components.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Id to restore under.
    pub id: EntityId,
    /// Position, if any.
    pub position: Option<Position>,
    /// Appearance, if any.
    pub appearance: Option<Appearance>,
    /// Health, if any.
    pub health: Option<Health>,
    /// Power, if any.
    pub power: Option<Power>,
    /// Defense, if any.
    pub defense: Option<Defense>,
    /// Description, if any.
    pub description: Option<Description>,
    /// Active effects, if any.
    pub active_effects: Option<ActiveEffects>,
    /// Terrain, if any.
    pub terrain: Option<Terrain>,
    /// Consumable, if any.
    pub consumable: Option<Consumable>,
    /// Inventory, if any.
    pub inventory: Option<Inventory>,
    /// Attached data-less tag components.
    pub flags: Vec<ComponentKind>,
}

/// Every live entity in a store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Slot table length, so freed slots keep their place.
    pub slot_count: usize,
    /// Live entities in slot order.
    pub entities: Vec<EntitySnapshot>,
}

const FLAG_KINDS: [ComponentKind; 9] = [
    ComponentKind::Blocking,
    ComponentKind::Opaque,
    ComponentKind::Visible,
    ComponentKind::Revealed,
    ComponentKind::AiTag,
    ComponentKind::Player,
    ComponentKind::Dead,
    ComponentKind::Paralyzed,
    ComponentKind::Item,
];

impl EntityStore {
    /// Captures every live entity.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let entities = self
            .iter_alive()
            .map(|id| EntitySnapshot {
                id,
                position: self.get::<Position>(id).copied(),
                appearance: self.get::<Appearance>(id).copied(),
                health: self.get::<Health>(id).copied(),
                power: self.get::<Power>(id).copied(),
                defense: self.get::<Defense>(id).copied(),
                description: self.get::<Description>(id).cloned(),
                active_effects: self.get::<ActiveEffects>(id).cloned(),
                terrain: self.get::<Terrain>(id).copied(),
                consumable: self.get::<Consumable>(id).cloned(),
                inventory: self.get::<Inventory>(id).cloned(),
                flags: FLAG_KINDS
                    .into_iter()
                    .filter(|&kind| self.has_kind(id, kind))
                    .collect(),
            })
            .collect();

        StoreSnapshot {
            slot_count: self.slot_count(),
            entities,
        }
    }

    /// Replaces the store's contents with a snapshot.
    ///
    /// Ids are preserved and the spatial index is rebuilt through the normal
    /// attach path.
    ///
    /// # Errors
    ///
    /// Propagates attach failures, which only occur for a malformed snapshot
    /// listing the same slot twice.
    pub fn restore(&mut self, snapshot: &StoreSnapshot) -> StoreResult<()> {
        let live: Vec<EntityId> = snapshot.entities.iter().map(|e| e.id).collect();
        let slot_count = live
            .iter()
            .map(|id| id.index() as usize + 1)
            .max()
            .unwrap_or(0)
            .max(snapshot.slot_count);
        self.reset_slots(slot_count, &live);

        for entity in &snapshot.entities {
            let id = entity.id;
            attach_opt(self, id, entity.position)?;
            attach_opt(self, id, entity.appearance)?;
            attach_opt(self, id, entity.health)?;
            attach_opt(self, id, entity.power)?;
            attach_opt(self, id, entity.defense)?;
            attach_opt(self, id, entity.description.clone())?;
            attach_opt(self, id, entity.active_effects.clone())?;
            attach_opt(self, id, entity.terrain)?;
            attach_opt(self, id, entity.consumable.clone())?;
            attach_opt(self, id, entity.inventory.clone())?;
            for &kind in &entity.flags {
                attach_flag(self, id, kind)?;
            }
        }
        Ok(())
    }
}

fn attach_opt<C: Component>(store: &mut EntityStore, id: EntityId, value: Option<C>) -> StoreResult<()> {
    if let Some(value) = value {
        store.attach(id, value)?;
    }
    Ok(())
}

fn attach_flag(store: &mut EntityStore, id: EntityId, kind: ComponentKind) -> StoreResult<()> {
    match kind {
        ComponentKind::Blocking => store.attach(id, Blocking).map(drop),
        ComponentKind::Opaque => store.attach(id, Opaque).map(drop),
        ComponentKind::Visible => store.attach(id, Visible).map(drop),
        ComponentKind::Revealed => store.attach(id, Revealed).map(drop),
        ComponentKind::AiTag => store.attach(id, AiTag).map(drop),
        ComponentKind::Player => store.attach(id, Player).map(drop),
        ComponentKind::Dead => store.attach(id, Dead).map(drop),
        ComponentKind::Paralyzed => store.attach(id, Paralyzed).map(drop),
        ComponentKind::Item => store.attach(id, Item).map(drop),
        _ => Ok(()),
    }
}
