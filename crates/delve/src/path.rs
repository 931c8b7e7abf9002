//! # Pathfinding
//!
//! A* over a per-level occupancy grid. The grid is rebuilt from the spatial
//! index on every call; a cached grid would let actors walk through tiles
//! that became blocked since it was built.

use pathfinding::prelude::astar;

use delve_core::{Blocking, EntityStore, LocationKey};

use crate::level::LevelBounds;

/// Blocked/open flags for one level, row-major.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    level: i32,
    bounds: LevelBounds,
    blocked: Vec<bool>,
}

impl OccupancyGrid {
    /// Scans the spatial index: a cell is blocked if any occupant has
    /// [`Blocking`].
    #[must_use]
    pub fn build(store: &EntityStore, level: i32, bounds: LevelBounds) -> Self {
        let mut grid = Self {
            level,
            bounds,
            blocked: vec![false; bounds.area()],
        };
        for (key, ids) in store.spatial().iter_level(level) {
            if ids.iter().any(|&id| store.has::<Blocking>(id)) {
                if let Some(i) = grid.offset(key) {
                    grid.blocked[i] = true;
                }
            }
        }
        grid
    }

    fn offset(&self, key: LocationKey) -> Option<usize> {
        (key.level == self.level && self.bounds.contains(key.x, key.y))
            .then(|| (key.y * self.bounds.width + key.x) as usize)
    }

    /// True if `key` is outside the level or blocked.
    #[must_use]
    pub fn is_blocked(&self, key: LocationKey) -> bool {
        self.offset(key).map_or(true, |i| self.blocked[i])
    }

    /// Marks a cell open.
    pub fn unblock(&mut self, key: LocationKey) {
        if let Some(i) = self.offset(key) {
            self.blocked[i] = false;
        }
    }

    fn neighbours(&self, key: LocationKey) -> Vec<(LocationKey, u32)> {
        [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .into_iter()
            .map(|(dx, dy)| key.offset(dx, dy))
            .filter(|next| !self.is_blocked(*next))
            .map(|next| (next, 1))
            .collect()
    }
}

/// Shortest 4-directional path from `start` to `goal`, both inclusive.
///
/// The start and goal cells are always treated as open, so an actor is
/// never trapped by its own or its target's occupancy. Returns an empty
/// path if the cells are on different levels, outside the bounds, or
/// unreachable. The first element is `start`; a single step uses the
/// second.
#[must_use]
pub fn find_path(
    store: &EntityStore,
    bounds: LevelBounds,
    start: LocationKey,
    goal: LocationKey,
) -> Vec<LocationKey> {
    if start.level != goal.level
        || !bounds.contains(start.x, start.y)
        || !bounds.contains(goal.x, goal.y)
    {
        return Vec::new();
    }

    let mut grid = OccupancyGrid::build(store, start.level, bounds);
    grid.unblock(start);
    grid.unblock(goal);

    astar(
        &start,
        |cell| grid.neighbours(*cell),
        |cell| cell.manhattan(goal),
        |cell| *cell == goal,
    )
    .map(|(path, _)| path)
    .unwrap_or_default()
}
