//! # Spatial Index
//!
//! Maps a discretized location `(x, y, level)` to the entities occupying it.
//!
//! The index is the single source of truth for "what is on this tile". It is
//! owned by [`EntityStore`](crate::EntityStore) and only mutated through the
//! store's Position lifecycle hooks, so it can always be rebuilt from
//! Position components alone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::ecs::EntityId;
use crate::error::LocationParseError;

/// Canonical key for one grid cell on one dungeon level.
///
/// The string form is `x,y,level` (e.g. `-3,4,-1`). The separator never
/// appears inside a signed integer, so the encoding round-trips exactly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Dungeon level.
    pub level: i32,
}

impl LocationKey {
    /// Creates a new key.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, level: i32) -> Self {
        Self { x, y, level }
    }

    /// Key shifted by `(dx, dy)` on the same level.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.level)
    }

    /// Squared Euclidean distance on the grid, ignoring level.
    #[inline]
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Manhattan distance on the grid, ignoring level.
    #[inline]
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.level)
    }
}

impl FromStr for LocationKey {
    type Err = LocationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let mut next = || -> Result<i32, LocationParseError> {
            let part = parts
                .next()
                .ok_or_else(|| LocationParseError::WrongArity(s.to_string()))?;
            part.parse()
                .map_err(|_| LocationParseError::BadCoordinate(part.to_string()))
        };
        let key = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(LocationParseError::WrongArity(s.to_string()));
        }
        Ok(key)
    }
}

/// Location-keyed occupancy index.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    /// Occupants per location, in insertion order. Empty buckets are removed.
    buckets: HashMap<LocationKey, Vec<EntityId>>,
    /// Total number of (entity, location) entries.
    entries: usize,
}

impl SpatialIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities at a location. Empty slice if none.
    #[must_use]
    pub fn entities_at(&self, key: LocationKey) -> &[EntityId] {
        self.buckets.get(&key).map_or(&[], Vec::as_slice)
    }

    /// True if `id` is recorded at `key`.
    #[must_use]
    pub fn contains(&self, id: EntityId, key: LocationKey) -> bool {
        self.entities_at(key).contains(&id)
    }

    /// Records `id` at `key`. Adding an existing entry is a no-op.
    pub fn add(&mut self, id: EntityId, key: LocationKey) {
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.contains(&id) {
            bucket.push(id);
            self.entries += 1;
        }
    }

    /// Removes `id` from `key`. Returns `false` if it was not there.
    pub fn remove(&mut self, id: EntityId, key: LocationKey) -> bool {
        let Some(bucket) = self.buckets.get_mut(&key) else {
            return false;
        };
        let Some(slot) = bucket.iter().position(|&e| e == id) else {
            return false;
        };
        bucket.remove(slot);
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.entries -= 1;
        true
    }

    /// Moves `id` from one bucket to another.
    ///
    /// The new entry is written before the old one is dropped, so the entity
    /// is never absent from both.
    pub fn relocate(&mut self, id: EntityId, from: LocationKey, to: LocationKey) {
        if from == to {
            self.add(id, to);
            return;
        }
        self.add(id, to);
        self.remove(id, from);
    }

    /// Number of (entity, location) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// True if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Iterates every non-empty bucket.
    pub fn iter(&self) -> impl Iterator<Item = (LocationKey, &[EntityId])> {
        self.buckets.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Iterates every non-empty bucket on one level.
    pub fn iter_level(&self, level: i32) -> impl Iterator<Item = (LocationKey, &[EntityId])> {
        self.iter().filter(move |(k, _)| k.level == level)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.entries = 0;
    }
}
