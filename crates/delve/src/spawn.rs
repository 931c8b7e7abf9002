//! # Spawning
//!
//! Seeded placement of monsters and items on a freshly loaded level. Every
//! draw comes from the world's ChaCha RNG, so a seed reproduces the same
//! population.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use delve_core::{Blocking, EntityId, Item};

use crate::error::SimResult;
use crate::level::LevelData;
use crate::prefabs::{self, ItemKind};
use crate::world::GameWorld;

/// Weighted item table, weights out of 100.
const ITEM_WEIGHTS: [(ItemKind, u32); 4] = [
    (ItemKind::HealthPotion, 40),
    (ItemKind::LightningScroll, 30),
    (ItemKind::ParalysisScroll, 15),
    (ItemKind::FireballScroll, 15),
];

/// Picks an item kind from the weighted table.
pub fn roll_item<R: Rng + ?Sized>(rng: &mut R) -> ItemKind {
    let total: u32 = ITEM_WEIGHTS.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (kind, weight) in ITEM_WEIGHTS {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    ItemKind::HealthPotion
}

/// Places the configured number of monsters and items on distinct floor
/// cells that hold nothing blocking and no other item. Returns the spawned
/// entities, monsters first.
///
/// # Errors
///
/// Propagates store failures.
pub fn populate(world: &mut GameWorld, data: &LevelData) -> SimResult<Vec<EntityId>> {
    let mut candidates: Vec<_> = data
        .floor_cells()
        .into_iter()
        .filter(|&key| !world.store().any_at::<Blocking>(key) && !world.store().any_at::<Item>(key))
        .collect();
    candidates.shuffle(&mut world.rng);

    let monsters = world.config().spawn.monsters_per_level;
    let items = world.config().spawn.items_per_level;
    let mut cells = candidates.into_iter();
    let mut spawned = Vec::with_capacity(monsters + items);

    for at in cells.by_ref().take(monsters) {
        spawned.push(prefabs::goblin(world.store_mut(), at)?);
    }
    for at in cells.take(items) {
        let kind = roll_item(&mut world.rng);
        spawned.push(prefabs::item(world.store_mut(), at, kind)?);
    }

    debug!(level = data.level(), count = spawned.len(), "level populated");
    Ok(spawned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use delve_core::{LocationKey, TileKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_item_covers_table() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = Vec::new();
        for _ in 0..500 {
            let kind = roll_item(&mut rng);
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        assert_eq!(seen.len(), ItemKind::ALL.len());
    }

    #[test]
    fn test_populate_skips_occupied_and_caps_at_space() {
        let mut config = GameConfig::default();
        config.spawn.monsters_per_level = 10;
        config.spawn.items_per_level = 10;

        let mut world = GameWorld::empty(config);
        let data = LevelData::filled(-1, 3, 1, TileKind::Floor);
        world.add_level(&data).unwrap();
        world.spawn_player(LocationKey::new(0, 0, -1)).unwrap();

        let spawned = populate(&mut world, &data).unwrap();
        assert_eq!(spawned.len(), 2);
        assert!(world.store().entities_at(LocationKey::new(0, 0, -1)).len() == 2);
        assert!(world.store().verify_spatial_index().is_empty());
    }
}
