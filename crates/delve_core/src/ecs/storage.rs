//! # Component Storage
//!
//! Dense component storage indexed by entity slot.
//!
//! The storage uses a dense array strategy:
//! - One slot per entity index, whether or not the entity has the component
//! - Access is O(1) via entity index
//! - Presence is tracked by the entity's bitmask, not by the storage

use super::component::Component;

/// Dense storage for a single component type.
///
/// Slots for entities without the component hold `C::default()`.
///
/// # Example
///
/// ```rust,ignore
/// let mut storage: ComponentStorage<Health> = ComponentStorage::with_capacity(64);
/// storage.ensure_len(1);
/// storage.set(0, Health::new(10));
/// ```
#[derive(Debug)]
pub struct ComponentStorage<C: Component> {
    /// The dense array of components.
    data: Vec<C>,
}

impl<C: Component> ComponentStorage<C> {
    /// Creates empty storage with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Number of addressable slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if no slot has been allocated yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grows the storage with default values so `len` slots exist.
    pub fn ensure_len(&mut self, len: usize) {
        if self.data.len() < len {
            self.data.resize_with(len, C::default);
        }
    }

    /// Gets a component by entity index.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.data.get(index)
    }

    /// Gets a mutable component by entity index.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.data.get_mut(index)
    }

    /// Overwrites the slot, returning the previous value.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn set(&mut self, index: usize, component: C) -> Option<C> {
        self.data
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, component))
    }

    /// Moves the value out of the slot, leaving the default behind.
    #[inline]
    pub fn take(&mut self, index: usize) -> Option<C> {
        self.data.get_mut(index).map(std::mem::take)
    }

    /// Resets a component slot to its default value.
    #[inline]
    pub fn reset(&mut self, index: usize) {
        if let Some(slot) = self.data.get_mut(index) {
            *slot = C::default();
        }
    }
}

impl<C: Component> Default for ComponentStorage<C> {
    fn default() -> Self {
        Self { data: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::Health;

    #[test]
    fn test_storage_grows_with_defaults() {
        let mut storage: ComponentStorage<Health> = ComponentStorage::with_capacity(4);
        assert!(storage.is_empty());

        storage.ensure_len(3);
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.get(2), Some(&Health::default()));
        assert!(storage.get(3).is_none());
    }

    #[test]
    fn test_storage_set_take() {
        let mut storage: ComponentStorage<Health> = ComponentStorage::default();
        storage.ensure_len(2);

        assert_eq!(storage.set(1, Health::new(7)), Some(Health::default()));
        assert_eq!(storage.get(1), Some(&Health::new(7)));

        assert_eq!(storage.take(1), Some(Health::new(7)));
        assert_eq!(storage.get(1), Some(&Health::default()));
        assert!(storage.set(5, Health::new(1)).is_none());
    }
}
