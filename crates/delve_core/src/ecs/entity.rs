//! # Entity Management
//!
//! Entities are opaque identifiers consisting of:
//! - A slot index into the dense component arrays
//! - A generation counter so a recycled slot never aliases a destroyed entity

use serde::{Deserialize, Serialize};
use std::fmt;

use super::component::{ComponentKind, ComponentMask};

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: slot index into component arrays
/// - Upper 32 bits: generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from slot index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the slot index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the packed 64-bit form.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Slot record tracking liveness and which components are attached.
#[derive(Clone, Copy, Debug)]
pub struct Entity {
    /// The identifier currently occupying this slot.
    pub id: EntityId,
    /// Bitmask of attached component kinds.
    pub mask: ComponentMask,
    /// Whether this slot is currently alive.
    pub alive: bool,
}

impl Entity {
    /// Creates a live entity with no components.
    #[inline]
    #[must_use]
    pub const fn new(id: EntityId) -> Self {
        Self {
            id,
            mask: ComponentMask::EMPTY,
            alive: true,
        }
    }

    /// Creates a dead/empty entity slot that remembers its last generation.
    #[inline]
    #[must_use]
    pub const fn dead(id: EntityId) -> Self {
        Self {
            id,
            mask: ComponentMask::EMPTY,
            alive: false,
        }
    }

    /// Checks if this entity has a component of the given kind.
    #[inline]
    #[must_use]
    pub const fn has(self, kind: ComponentKind) -> bool {
        self.mask.contains(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
    }

    #[test]
    fn test_null_id() {
        assert!(EntityId::NULL.is_null());
        assert!(EntityId::default().is_null());
        assert!(!EntityId::new(0, 0).is_null());
    }

    #[test]
    fn test_entity_mask() {
        let mut entity = Entity::new(EntityId::new(0, 1));
        assert!(!entity.has(ComponentKind::Blocking));

        entity.mask.insert(ComponentKind::Blocking);
        assert!(entity.has(ComponentKind::Blocking));

        entity.mask.remove(ComponentKind::Blocking);
        assert!(!entity.has(ComponentKind::Blocking));
    }
}
