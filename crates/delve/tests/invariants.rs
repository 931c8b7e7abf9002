//! # Simulation Invariants
//!
//! Properties that must hold for whole playthroughs, not single calls:
//!
//! 1. **Index consistency**: every positioned entity sits in exactly one
//!    bucket matching its Position, under random play
//! 2. **Visibility**: exact disc in the open, no peeking past a wall corner
//! 3. **Pathfinding**: symmetric lengths, empty when walled in
//! 4. **Effects**: a one-turn modifier reverses exactly once
//! 5. **Determinism**: same seed and intents give the same playthrough

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use delve::core::{
    ActiveEffects, EffectSpec, EntityStore, LocationKey, Position, Power, Revealed, StatKind,
    TileKind, Visible,
};
use delve::fov::compute_visible_in;
use delve::{
    effects, find_path, prefabs, AsciiLevels, GameConfig, GameWorld, Intent, LevelBounds,
    LevelData, TurnScheduler,
};

const CAVE: &str = "
####################
#<.....#...........#
#......#....###....#
#......#....#......#
#...........#......#
#######.....#......#
#...........####...#
#..####............#
#.................>#
####################
";

fn busy_config(seed: u64) -> GameConfig {
    let mut config = GameConfig::default();
    config.seed = seed;
    config.spawn.monsters_per_level = 5;
    config.spawn.items_per_level = 4;
    config
}

fn random_intent(rng: &mut ChaCha8Rng) -> Intent {
    match rng.gen_range(0..10) {
        0 => Intent::Wait,
        1 => Intent::PickUp,
        2 => Intent::UseItem(0),
        3 => Intent::Descend,
        _ => {
            let (dx, dy) = [(0, -1), (1, 0), (0, 1), (-1, 0)][rng.gen_range(0..4)];
            Intent::Move { dx, dy }
        }
    }
}

/// Plays `steps` random intents, answering target prompts with the player's
/// own cell offset by two.
fn play(seed: u64, steps: usize, mut check: impl FnMut(&GameWorld)) -> GameWorld {
    let mut world = GameWorld::new(busy_config(seed), AsciiLevels::new([CAVE])).unwrap();
    let mut scheduler = TurnScheduler::new();
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xD1CE);

    for _ in 0..steps {
        let intent = random_intent(&mut rng);
        match scheduler.submit(&mut world, intent) {
            Ok(delve::TurnOutcome::NeedsTarget { .. }) => {
                let at = world.player_position().unwrap().offset(2, 0);
                scheduler.submit(&mut world, Intent::Target(at)).unwrap();
            }
            Ok(_) => {}
            Err(_) => break,
        }
        check(&world);
    }
    world
}

// ============================================================================
// INDEX CONSISTENCY
// ============================================================================

#[test]
fn test_index_matches_positions_under_random_play() {
    for seed in [1, 2, 3] {
        play(seed, 300, |world| {
            let violations = world.store().verify_spatial_index();
            assert!(violations.is_empty(), "seed {seed}: {violations:?}");
        });
    }
}

#[test]
fn test_index_matches_positions_under_store_churn() {
    let mut store = EntityStore::new();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut live = Vec::new();

    for _ in 0..2_000 {
        match rng.gen_range(0..4) {
            0 => {
                let id = store.create();
                let at = Position::new(rng.gen_range(0..8), rng.gen_range(0..8), -1);
                store.attach(id, at).unwrap();
                live.push(id);
            }
            1 if !live.is_empty() => {
                let id = live.swap_remove(rng.gen_range(0..live.len()));
                store.destroy(id);
            }
            2 if !live.is_empty() => {
                let id = live[rng.gen_range(0..live.len())];
                let to = Position::new(rng.gen_range(0..8), rng.gen_range(0..8), -2);
                store.set_position(id, to).unwrap();
            }
            _ if !live.is_empty() => {
                let id = live[rng.gen_range(0..live.len())];
                store.detach::<Position>(id);
            }
            _ => {}
        }
        assert!(store.verify_spatial_index().is_empty());
    }
}

// ============================================================================
// VISIBILITY
// ============================================================================

#[test]
fn test_open_field_visibility_is_exact_disc() {
    let origin = LocationKey::new(0, 0, -3);
    for radius in [1, 4, 7] {
        let visible = compute_visible_in(&HashSet::new(), origin, radius);
        let mut expected = HashSet::new();
        for y in -radius..=radius {
            for x in -radius..=radius {
                if x * x + y * y <= radius * radius {
                    expected.insert(LocationKey::new(x, y, -3));
                }
            }
        }
        assert_eq!(visible, expected, "radius {radius}");
    }
}

#[test]
fn test_no_corner_peeking() {
    let origin = LocationKey::new(1, 1, -1);
    let opaque: HashSet<_> = [LocationKey::new(2, 1, -1)].into_iter().collect();
    let visible = compute_visible_in(&opaque, origin, 1);

    assert!(visible.contains(&LocationKey::new(2, 1, -1)));
    assert!(visible.contains(&LocationKey::new(1, 2, -1)));
    assert!(visible.contains(&LocationKey::new(0, 1, -1)));
    assert!(!visible.contains(&LocationKey::new(3, 1, -1)));

    let far = compute_visible_in(&opaque, origin, 4);
    assert!(!far.contains(&LocationKey::new(3, 1, -1)));
    assert!(!far.contains(&LocationKey::new(4, 1, -1)));
}

#[test]
fn test_diagonal_wall_hides_cell_behind_it() {
    let origin = LocationKey::new(0, 0, -1);
    let wall = LocationKey::new(1, 1, -1);
    let opaque: HashSet<_> = [wall].into_iter().collect();
    let visible = compute_visible_in(&opaque, origin, 3);

    assert!(visible.contains(&wall));
    assert!(!visible.contains(&LocationKey::new(2, 2, -1)));
    for (x, y) in [(1, 0), (0, 1), (2, 1), (1, 2), (3, 0), (0, 3)] {
        assert!(visible.contains(&LocationKey::new(x, y, -1)), "({x},{y})");
    }
}

#[test]
fn test_revealed_survives_losing_sight() {
    let mut world = GameWorld::new(busy_config(5), AsciiLevels::new([CAVE])).unwrap();
    let mut scheduler = TurnScheduler::new();
    let player = world.player();

    let seen_at_start: Vec<_> = world
        .store()
        .query(delve::core::Query::new().with::<Visible>())
        .filter(|&id| id != player)
        .collect();
    assert!(!seen_at_start.is_empty());

    for _ in 0..6 {
        if scheduler
            .submit(&mut world, Intent::Move { dx: 1, dy: 0 })
            .is_err()
        {
            break;
        }
    }
    for id in seen_at_start {
        if world.store().is_alive(id) {
            assert!(world.store().has::<Revealed>(id));
        }
    }
}

// ============================================================================
// PATHFINDING
// ============================================================================

#[test]
fn test_path_lengths_are_symmetric() {
    let data = LevelData::from_ascii(-1, CAVE).unwrap();
    let mut world = GameWorld::empty(GameConfig::default());
    world.add_level(&data).unwrap();
    let bounds = data.bounds();

    let cells = data.open_cells();
    for (a, b) in cells.iter().zip(cells.iter().rev()).take(20) {
        let forward = find_path(world.store(), bounds, *a, *b);
        let backward = find_path(world.store(), bounds, *b, *a);
        assert_eq!(forward.len(), backward.len(), "{a} <-> {b}");
        assert!(!forward.is_empty());
    }
}

#[test]
fn test_walled_in_goal_is_unreachable() {
    let mut world = GameWorld::empty(GameConfig::default());
    world
        .add_level(&LevelData::filled(-1, 7, 7, TileKind::Floor))
        .unwrap();
    let goal = LocationKey::new(3, 3, -1);
    for (dx, dy) in [(0, -1), (1, 0), (0, 1), (-1, 0)] {
        prefabs::terrain(world.store_mut(), goal.offset(dx, dy), TileKind::Wall).unwrap();
    }

    let bounds = LevelBounds::new(7, 7);
    let start = LocationKey::new(0, 0, -1);
    assert!(find_path(world.store(), bounds, start, goal).is_empty());
    assert!(find_path(world.store(), bounds, goal, start).is_empty());
}

// ============================================================================
// EFFECTS
// ============================================================================

#[test]
fn test_one_turn_modifier_expires_exactly_once() {
    let mut world = GameWorld::empty(GameConfig::default());
    let player = world.spawn_player(LocationKey::new(0, 0, -1)).unwrap();
    let base = world.store().get::<Power>(player).unwrap().current;

    let rage = EffectSpec::instant("rage")
        .with_stat(StatKind::Power, 3)
        .lasting(1)
        .as_modifier();
    effects::apply(&mut world, player, &rage).unwrap();
    assert_eq!(world.store().get::<Power>(player).unwrap().current, base + 3);

    assert_eq!(effects::tick(&mut world), 1);
    assert_eq!(world.store().get::<Power>(player).unwrap().current, base);
    assert!(!world.store().has::<ActiveEffects>(player));

    assert_eq!(effects::tick(&mut world), 0);
    assert_eq!(world.store().get::<Power>(player).unwrap().current, base);
}

// ============================================================================
// DETERMINISM
// ============================================================================

#[test]
fn test_same_seed_same_playthrough() {
    let a = play(42, 150, |_| {});
    let b = play(42, 150, |_| {});

    assert_eq!(a.turn(), b.turn());
    assert_eq!(a.level(), b.level());
    assert_eq!(
        a.messages().iter().collect::<Vec<_>>(),
        b.messages().iter().collect::<Vec<_>>()
    );
    assert_eq!(a.snapshot().store, b.snapshot().store);
}
