//! # Field of View
//!
//! Recursive shadowcasting over eight octants. Each octant is scanned row
//! by row outward from the origin while a slope interval tracks the
//! unobstructed angular span. An opaque cell inside a lit run splits the
//! scan: the next row is recursed into with the interval ending at the
//! cell's left edge, and the current row continues past its right edge.
//!
//! Opacity is read from a snapshot taken once per call, so entities that
//! change during the walk are never observed.

use std::collections::HashSet;

use delve_core::{EntityStore, LocationKey, Opaque, Query, Revealed, StoreResult, Visible};
use tracing::warn;

/// Octant transforms: `(xx, xy, yx, yy)` per column.
const MULT: [[i32; 8]; 4] = [
    [1, 0, 0, -1, -1, 0, 0, 1],
    [0, 1, -1, 0, 0, -1, 1, 0],
    [0, 1, 1, 0, 0, -1, -1, 0],
    [1, 0, 0, 1, -1, 0, 0, -1],
];

/// Cells on one level holding at least one Opaque occupant.
#[must_use]
pub fn opaque_snapshot(store: &EntityStore, level: i32) -> HashSet<LocationKey> {
    store
        .spatial()
        .iter_level(level)
        .filter(|(_, ids)| ids.iter().any(|&id| store.has::<Opaque>(id)))
        .map(|(key, _)| key)
        .collect()
}

/// Visible cells around `origin` on its level, reading opacity from the
/// store.
#[must_use]
pub fn compute_visible(store: &EntityStore, origin: LocationKey, radius: i32) -> HashSet<LocationKey> {
    let opaque = opaque_snapshot(store, origin.level);
    compute_visible_in(&opaque, origin, radius)
}

/// Visible cells around `origin` given a fixed opaque set.
///
/// A cell at exactly `radius` is included. The origin is always visible,
/// even when opaque.
#[must_use]
pub fn compute_visible_in(
    opaque: &HashSet<LocationKey>,
    origin: LocationKey,
    radius: i32,
) -> HashSet<LocationKey> {
    let mut caster = Caster {
        opaque,
        origin,
        radius: radius.max(0),
        visible: HashSet::new(),
    };
    caster.visible.insert(origin);
    for octant in 0..8 {
        let transform = (
            MULT[0][octant],
            MULT[1][octant],
            MULT[2][octant],
            MULT[3][octant],
        );
        caster.cast_light(1, 1.0, 0.0, transform);
    }
    caster.visible
}

struct Caster<'a> {
    opaque: &'a HashSet<LocationKey>,
    origin: LocationKey,
    radius: i32,
    visible: HashSet<LocationKey>,
}

impl Caster<'_> {
    fn cast_light(&mut self, row: i32, mut start: f64, end: f64, (xx, xy, yx, yy): (i32, i32, i32, i32)) {
        if start < end {
            return;
        }
        let radius_squared = self.radius * self.radius;
        let mut next_start = start;

        for j in row..=self.radius {
            let dy = -j;
            let mut blocked = false;

            for dx in -j..=0 {
                let cell = LocationKey::new(
                    self.origin.x + dx * xx + dy * xy,
                    self.origin.y + dx * yx + dy * yy,
                    self.origin.level,
                );
                let left_slope = (f64::from(dx) - 0.5) / (f64::from(dy) + 0.5);
                let right_slope = (f64::from(dx) + 0.5) / (f64::from(dy) - 0.5);

                if start < right_slope {
                    continue;
                }
                if end > left_slope {
                    break;
                }

                if dx * dx + dy * dy <= radius_squared {
                    self.visible.insert(cell);
                }

                let is_opaque = self.opaque.contains(&cell);
                if blocked {
                    if is_opaque {
                        next_start = right_slope;
                    } else {
                        blocked = false;
                        start = next_start;
                    }
                } else if is_opaque && j < self.radius {
                    blocked = true;
                    self.cast_light(j + 1, start, left_slope, (xx, xy, yx, yy));
                    next_start = right_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

/// Counts from one [`apply_visibility`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibilityUpdate {
    /// Entities marked Visible.
    pub visible: usize,
    /// Index entries skipped because the entity is gone or sits elsewhere.
    pub stale: usize,
}

/// Rewrites Visible flags from a freshly computed visible set.
///
/// Every entity loses Visible first; occupants of the visible cells then
/// gain Visible and Revealed. Revealed is never removed. Index entries
/// that disagree with the entity's Position are skipped and counted as
/// stale.
///
/// # Errors
///
/// Propagates store failures while attaching flags.
pub fn apply_visibility(
    store: &mut EntityStore,
    visible: &HashSet<LocationKey>,
) -> StoreResult<VisibilityUpdate> {
    let previously: Vec<_> = store.query(Query::new().with::<Visible>()).collect();
    for id in previously {
        store.detach::<Visible>(id);
    }

    let mut update = VisibilityUpdate::default();
    let mut seen = Vec::new();
    for &key in visible {
        for &id in store.entities_at(key) {
            if store.location_of(id) == Some(key) {
                seen.push(id);
            } else {
                warn!(entity = %id, at = %key, "stale index entry skipped");
                update.stale += 1;
            }
        }
    }
    for &id in &seen {
        store.attach(id, Visible)?;
        store.attach(id, Revealed)?;
    }
    update.visible = seen.len();
    Ok(update)
}
