//! # Entity Store
//!
//! The central container for all entities, their components and the
//! spatial index derived from Position components.

use tracing::{debug, error, warn};

use super::component::{Component, ComponentKind, ComponentMask, ComponentTables, Mutable, Position};
use super::entity::{Entity, EntityId};
use super::query::Query;
use crate::error::{IndexViolation, StoreError, StoreResult};
use crate::spatial::{LocationKey, SpatialIndex};

/// The entity store - container for all simulation state.
///
/// Component tables grow with the entity table; slots of destroyed entities
/// are recycled through a free list with a bumped generation.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = EntityStore::new();
/// let goblin = store.create();
/// store.attach(goblin, Position::new(5, 6, -1))?;
/// store.attach(goblin, Blocking)?;
/// assert_eq!(store.entities_at(LocationKey::new(5, 6, -1)), &[goblin]);
/// ```
#[derive(Default)]
pub struct EntityStore {
    /// All entity slots, alive or dead.
    entities: Vec<Entity>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    /// Number of currently alive entities.
    alive_count: usize,
    /// Per-kind component tables.
    tables: ComponentTables,
    /// Location index kept in step with Position components.
    spatial: SpatialIndex,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` entities.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entities: Vec::with_capacity(capacity),
            free_indices: Vec::new(),
            alive_count: 0,
            tables: ComponentTables::default(),
            spatial: SpatialIndex::new(),
        }
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Creates a new entity with no components.
    pub fn create(&mut self) -> EntityId {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.entities[index as usize];
            let id = EntityId::new(index, slot.id.generation().wrapping_add(1));
            *slot = Entity::new(id);
            id
        } else {
            let id = EntityId::new(self.entities.len() as u32, 0);
            self.entities.push(Entity::new(id));
            self.tables.grow(self.entities.len());
            id
        };
        self.alive_count += 1;
        id
    }

    /// Destroys an entity, removing all its components and its index entry.
    ///
    /// Destroying a dead or stale id is a logged no-op; returns `false`.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let Ok(index) = self.slot(id) else {
            warn!(entity = %id, "destroy of a dead entity ignored");
            return false;
        };

        if self.entities[index].has(ComponentKind::Position) {
            if let Some(pos) = self.tables.positions.get(index) {
                self.spatial.remove(id, pos.key());
            }
        }

        self.tables.reset(index);
        self.entities[index] = Entity::dead(id);
        self.free_indices.push(id.index());
        self.alive_count -= 1;
        debug!(entity = %id, "destroyed");
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slot(id).is_ok()
    }

    /// Attaches (or replaces) a component.
    ///
    /// Location-bearing components update the spatial index in the same
    /// call: a replacement relocates the entry instead of removing and
    /// re-adding it. Returns the replaced value, if any.
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleEntity`] if `id` is not alive.
    pub fn attach<C: Component>(&mut self, id: EntityId, component: C) -> StoreResult<Option<C>> {
        let index = self.slot(id)?;
        let had = self.entities[index].has(C::KIND);
        let to = component.location();

        let replaced = C::storage_mut(&mut self.tables).set(index, component);
        let previous = if had { replaced } else { None };

        match (previous.as_ref().and_then(Component::location), to) {
            (Some(from), Some(to)) => self.spatial.relocate(id, from, to),
            (None, Some(to)) => self.spatial.add(id, to),
            (Some(from), None) => {
                self.spatial.remove(id, from);
            }
            (None, None) => {}
        }

        self.entities[index].mask.insert(C::KIND);
        Ok(previous)
    }

    /// Detaches a component, returning it. `None` if absent or stale.
    pub fn detach<C: Component>(&mut self, id: EntityId) -> Option<C> {
        let index = self.slot(id).ok()?;
        if !self.entities[index].has(C::KIND) {
            return None;
        }
        let old = C::storage_mut(&mut self.tables).take(index)?;
        if let Some(at) = old.location() {
            self.spatial.remove(id, at);
        }
        self.entities[index].mask.remove(C::KIND);
        Some(old)
    }

    /// Moves an entity to a new position, keeping the index in step.
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleEntity`] if `id` is not alive.
    pub fn set_position(&mut self, id: EntityId, position: Position) -> StoreResult<()> {
        self.attach(id, position).map(|_| ())
    }

    /// Gets a component. `None` if absent or stale.
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        let index = self.slot(id).ok()?;
        if !self.entities[index].has(C::KIND) {
            return None;
        }
        C::storage(&self.tables).get(index)
    }

    /// Gets a mutable component. `None` if absent or stale.
    pub fn get_mut<C: Mutable>(&mut self, id: EntityId) -> Option<&mut C> {
        let index = self.slot(id).ok()?;
        if !self.entities[index].has(C::KIND) {
            return None;
        }
        C::storage_mut(&mut self.tables).get_mut(index)
    }

    /// Gets a component or reports which one was missing.
    ///
    /// # Errors
    ///
    /// [`StoreError::StaleEntity`] or [`StoreError::MissingComponent`].
    pub fn require<C: Component>(&self, id: EntityId) -> StoreResult<&C> {
        self.slot(id)?;
        self.get::<C>(id).ok_or(StoreError::MissingComponent {
            entity: id,
            kind: C::KIND,
        })
    }

    /// True if the entity is alive and has `C`.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        self.has_kind(id, C::KIND)
    }

    /// True if the entity is alive and has a component of `kind`.
    #[must_use]
    pub fn has_kind(&self, id: EntityId, kind: ComponentKind) -> bool {
        self.mask(id).is_some_and(|mask| mask.contains(kind))
    }

    /// Component mask of a live entity.
    #[must_use]
    pub fn mask(&self, id: EntityId) -> Option<ComponentMask> {
        let index = self.slot(id).ok()?;
        Some(self.entities[index].mask)
    }

    /// Location key of an entity's Position, if it has one.
    #[must_use]
    pub fn location_of(&self, id: EntityId) -> Option<LocationKey> {
        self.get::<Position>(id).map(|p| p.key())
    }

    /// Entities matching `query`, in slot order.
    ///
    /// Evaluated against the current attach state on every call.
    ///
    /// # Panics
    ///
    /// In debug builds, if the query names no component kind.
    pub fn query(&self, query: Query) -> impl Iterator<Item = EntityId> + '_ {
        debug_assert!(query.is_valid(), "query must name at least one component kind");
        self.entities
            .iter()
            .filter(move |e| e.alive && query.matches(e.mask))
            .map(|e| e.id)
    }

    /// Iterates over all alive entity ids, in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().filter(|e| e.alive).map(|e| e.id)
    }

    /// Entities at a location.
    #[must_use]
    pub fn entities_at(&self, key: LocationKey) -> &[EntityId] {
        self.spatial.entities_at(key)
    }

    /// True if any entity at `key` has `C`.
    #[must_use]
    pub fn any_at<C: Component>(&self, key: LocationKey) -> bool {
        self.entities_at(key).iter().any(|&id| self.has::<C>(id))
    }

    /// Read access to the spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Raw write access to the spatial index. Edits bypass the Position
    /// hooks; run [`EntityStore::repair_spatial_index`] afterwards.
    pub fn spatial_mut(&mut self) -> &mut SpatialIndex {
        &mut self.spatial
    }

    /// Lists every disagreement between Position components and the index.
    #[must_use]
    pub fn verify_spatial_index(&self) -> Vec<IndexViolation> {
        let mut violations = Vec::new();
        for (at, ids) in self.spatial.iter() {
            for &entity in ids {
                if self.location_of(entity) != Some(at) {
                    violations.push(IndexViolation::Orphaned { entity, at });
                }
            }
        }
        for entity in self.query(Query::new().with::<Position>()) {
            if let Some(at) = self.location_of(entity) {
                if !self.spatial.contains(entity, at) {
                    violations.push(IndexViolation::Missing { entity, at });
                }
            }
        }
        violations
    }

    /// Repairs a corrupted index: orphaned entries are dropped, missing
    /// entries are re-added. Returns the number of repairs.
    pub fn repair_spatial_index(&mut self) -> usize {
        let violations = self.verify_spatial_index();
        for violation in &violations {
            match *violation {
                IndexViolation::Orphaned { entity, at } => {
                    error!(entity = %entity, %at, "index entry without matching Position removed");
                    self.spatial.remove(entity, at);
                }
                IndexViolation::Missing { entity, at } => {
                    error!(entity = %entity, %at, "Position missing from index re-added");
                    self.spatial.add(entity, at);
                }
            }
        }
        violations.len()
    }

    /// Discards the index and rebuilds it from Position components alone.
    pub fn rebuild_spatial_index(&mut self) {
        self.spatial.clear();
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.alive && entity.has(ComponentKind::Position) {
                if let Some(pos) = self.tables.positions.get(index) {
                    self.spatial.add(entity.id, pos.key());
                }
            }
        }
    }

    /// Number of slots in the entity table, alive or dead.
    #[must_use]
    pub(crate) fn slot_count(&self) -> usize {
        self.entities.len()
    }

    /// Rebuilds the slot table with exactly the given live ids.
    pub(crate) fn reset_slots(&mut self, slot_count: usize, live: &[EntityId]) {
        self.entities = (0..slot_count)
            .map(|i| Entity::dead(EntityId::new(i as u32, 0)))
            .collect();
        self.tables = ComponentTables::default();
        self.tables.grow(slot_count);
        self.spatial.clear();
        for &id in live {
            self.entities[id.index() as usize] = Entity::new(id);
        }
        self.free_indices = self
            .entities
            .iter()
            .rev()
            .filter(|e| !e.alive)
            .map(|e| e.id.index())
            .collect();
        self.alive_count = live.len();
    }

    fn slot(&self, id: EntityId) -> StoreResult<usize> {
        let index = id.index() as usize;
        match self.entities.get(index) {
            Some(entity) if entity.alive && entity.id == id => Ok(index),
            _ => Err(StoreError::StaleEntity(id)),
        }
    }
}
