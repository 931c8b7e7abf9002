//! # Turn Scenarios
//!
//! End-to-end checks driven through the turn scheduler:
//!
//! 1. **Melee**: bumping a monster attacks it without moving the attacker
//! 2. **Death**: a killed monster stops blocking in the same step
//! 3. **Paralysis**: a two-turn effect holds a monster for two world passes
//! 4. **Stairs, items, game over and save/load**

use delve::core::{
    AiTag, Blocking, Dead, EffectSpec, EntityId, Health, Inventory, LocationKey, Paralyzed, Power,
    TagKind, TileKind,
};
use delve::{
    effects, find_path, prefabs, AsciiLevels, GameConfig, GameEvent, GameWorld, Intent, LevelData,
    MetaCommand, TurnError, TurnOutcome, TurnScheduler, TurnState,
};

const DUNGEON: &str = "
############
#<.........#
#..........#
#..........#
#.........>#
############
";

fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.spawn.monsters_per_level = 0;
    config.spawn.items_per_level = 0;
    config
}

/// Open 10x10 level with the player at `at`.
fn open_field(at: LocationKey) -> (GameWorld, TurnScheduler) {
    let mut world = GameWorld::empty(quiet_config());
    world
        .add_level(&LevelData::filled(-1, 10, 10, TileKind::Floor))
        .unwrap();
    world.spawn_player(at).unwrap();
    world.update_fov().unwrap();
    let mut scheduler = TurnScheduler::new();
    scheduler.sync(&world);
    (world, scheduler)
}

fn position(world: &GameWorld, id: EntityId) -> LocationKey {
    world.store().location_of(id).unwrap()
}

// ============================================================================
// MELEE
// ============================================================================

#[test]
fn test_bump_attack_does_not_displace_attacker() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(5, 5, -1));
    let player = world.player();
    world.store_mut().get_mut::<Power>(player).unwrap().current = 3;
    let goblin = prefabs::goblin(world.store_mut(), LocationKey::new(5, 6, -1)).unwrap();
    world.store_mut().get_mut::<Power>(goblin).unwrap().current = 2;
    let before = world.store().get::<Health>(goblin).unwrap().current;

    let outcome = scheduler
        .submit(&mut world, Intent::Move { dx: 0, dy: 1 })
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Advanced { turn: 1 });
    let after = world.store().get::<Health>(goblin).unwrap().current;
    assert_eq!(before - after, 2);
    assert!(after > 0);
    assert!(!world.store().has::<Dead>(goblin));
    assert_eq!(position(&world, player), LocationKey::new(5, 5, -1));
}

#[test]
fn test_killed_monster_frees_its_cell_immediately() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(5, 5, -1));
    let goblin = prefabs::goblin(world.store_mut(), LocationKey::new(5, 6, -1)).unwrap();
    world.store_mut().get_mut::<Health>(goblin).unwrap().current = 2;
    let events = world.events();

    scheduler
        .submit(&mut world, Intent::Move { dx: 0, dy: 1 })
        .unwrap();

    let store = world.store();
    assert_eq!(store.get::<Health>(goblin).unwrap().current, 0);
    assert!(store.has::<Dead>(goblin));
    assert!(!store.has::<Blocking>(goblin));
    assert!(!store.has::<AiTag>(goblin));
    assert!(world.messages().contains("Goblin dies!"));
    assert!(events
        .drain()
        .iter()
        .any(|e| matches!(e, GameEvent::Died { entity, .. } if *entity == goblin)));

    let bounds = world.bounds(-1).unwrap();
    let route = find_path(
        world.store(),
        bounds,
        LocationKey::new(5, 5, -1),
        LocationKey::new(5, 7, -1),
    );
    assert_eq!(route.len(), 3);
    assert_eq!(route[1], LocationKey::new(5, 6, -1));

    // The corpse no longer blocks the player either.
    scheduler
        .submit(&mut world, Intent::Move { dx: 0, dy: 1 })
        .unwrap();
    assert_eq!(
        position(&world, world.player()),
        LocationKey::new(5, 6, -1)
    );
}

// ============================================================================
// PARALYSIS
// ============================================================================

#[test]
fn test_paralysis_holds_for_exactly_two_world_passes() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(1, 1, -1));
    let start = LocationKey::new(1, 6, -1);
    let goblin = prefabs::goblin(world.store_mut(), start).unwrap();
    world.update_fov().unwrap();

    let paralysis = EffectSpec::instant("paralysis")
        .lasting(2)
        .with_tag(TagKind::Paralyzed);
    effects::apply(&mut world, goblin, &paralysis).unwrap();
    assert!(world.store().has::<Paralyzed>(goblin));

    scheduler.submit(&mut world, Intent::Wait).unwrap();
    assert_eq!(position(&world, goblin), start);

    scheduler.submit(&mut world, Intent::Wait).unwrap();
    assert_eq!(position(&world, goblin), start);
    assert!(!world.store().has::<Paralyzed>(goblin));

    scheduler.submit(&mut world, Intent::Wait).unwrap();
    assert_eq!(position(&world, goblin), LocationKey::new(1, 5, -1));
}

#[test]
fn test_paralysis_scroll_freezes_nearest_monster() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(1, 1, -1));
    let goblin = prefabs::goblin(world.store_mut(), LocationKey::new(1, 4, -1)).unwrap();
    world.update_fov().unwrap();

    let at = world.player_position().unwrap();
    let scroll = prefabs::item(world.store_mut(), at, prefabs::ItemKind::ParalysisScroll).unwrap();
    scheduler.submit(&mut world, Intent::PickUp).unwrap();
    let after_pickup = position(&world, goblin);

    scheduler.submit(&mut world, Intent::UseItem(0)).unwrap();
    assert!(!world.store().is_alive(scroll));
    assert!(world.store().has::<Paralyzed>(goblin));
    for _ in 0..3 {
        scheduler.submit(&mut world, Intent::Wait).unwrap();
        assert_eq!(position(&world, goblin), after_pickup);
    }
}

// ============================================================================
// STAIRS
// ============================================================================

#[test]
fn test_descend_and_return() {
    let mut world = GameWorld::new(quiet_config(), AsciiLevels::new([DUNGEON])).unwrap();
    let mut scheduler = TurnScheduler::new();
    assert_eq!(world.player_position().unwrap(), LocationKey::new(1, 1, -1));

    assert_eq!(
        scheduler.submit(&mut world, Intent::Ascend).unwrap(),
        TurnOutcome::NoTurn
    );
    assert_eq!(world.level(), -1);

    for _ in 0..9 {
        scheduler
            .submit(&mut world, Intent::Move { dx: 1, dy: 0 })
            .unwrap();
    }
    for _ in 0..3 {
        scheduler
            .submit(&mut world, Intent::Move { dx: 0, dy: 1 })
            .unwrap();
    }
    assert_eq!(world.terrain_at(world.player_position().unwrap()), Some(TileKind::StairsDown));

    scheduler.submit(&mut world, Intent::Descend).unwrap();
    assert_eq!(world.level(), -2);
    assert_eq!(world.player_position().unwrap(), LocationKey::new(1, 1, -2));
    assert!(world.messages().contains("You arrive on level 2."));

    scheduler.submit(&mut world, Intent::Ascend).unwrap();
    assert_eq!(world.level(), -1);
    assert_eq!(world.player_position().unwrap(), LocationKey::new(10, 4, -1));
    assert!(world.store().verify_spatial_index().is_empty());
}

// ============================================================================
// ITEMS
// ============================================================================

#[test]
fn test_fireball_spares_cells_outside_radius() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(1, 1, -1));
    let near = prefabs::goblin(world.store_mut(), LocationKey::new(6, 6, -1)).unwrap();
    let edge = prefabs::goblin(world.store_mut(), LocationKey::new(7, 6, -1)).unwrap();
    let far = prefabs::goblin(world.store_mut(), LocationKey::new(8, 8, -1)).unwrap();

    let at = world.player_position().unwrap();
    prefabs::item(world.store_mut(), at, prefabs::ItemKind::FireballScroll).unwrap();
    scheduler.submit(&mut world, Intent::PickUp).unwrap();
    let near_at = position(&world, near);
    let edge_at = position(&world, edge);
    let far_at = position(&world, far);

    assert!(matches!(
        scheduler.submit(&mut world, Intent::UseItem(0)).unwrap(),
        TurnOutcome::NeedsTarget { .. }
    ));
    scheduler.submit(&mut world, Intent::Target(near_at)).unwrap();

    assert!(world.store().has::<Dead>(near));
    assert_eq!(
        world.store().has::<Dead>(edge),
        edge_at.distance_squared(near_at) <= i64::from(prefabs::FIREBALL_RADIUS).pow(2)
    );
    assert_eq!(
        world.store().has::<Dead>(far),
        far_at.distance_squared(near_at) <= i64::from(prefabs::FIREBALL_RADIUS).pow(2)
    );
    let player = world.player();
    assert!(world.store().get::<Inventory>(player).unwrap().items.is_empty());
}

// ============================================================================
// GAME OVER AND META COMMANDS
// ============================================================================

#[test]
fn test_game_over_then_load() {
    let (mut world, mut scheduler) = open_field(LocationKey::new(5, 5, -1));
    let saved = world.snapshot();

    let player = world.player();
    world.store_mut().get_mut::<Health>(player).unwrap().current = 1;
    let goblin = prefabs::goblin(world.store_mut(), LocationKey::new(5, 6, -1)).unwrap();
    world.store_mut().get_mut::<Power>(goblin).unwrap().current = 50;
    world.update_fov().unwrap();

    assert_eq!(
        scheduler.submit(&mut world, Intent::Wait).unwrap(),
        TurnOutcome::PlayerDied
    );
    assert!(world.messages().contains("You died!"));
    assert!(matches!(
        scheduler.submit(&mut world, Intent::PickUp),
        Err(TurnError::GameOver)
    ));

    assert_eq!(
        scheduler.submit(&mut world, Intent::LoadGame).unwrap(),
        TurnOutcome::Meta(MetaCommand::Load)
    );
    world.restore(&saved).unwrap();
    scheduler.sync(&world);

    assert_eq!(scheduler.state(), TurnState::AwaitingPlayerInput);
    assert!(!world.is_player_dead());
    assert!(!world.store().is_alive(goblin));
    assert_eq!(
        scheduler.submit(&mut world, Intent::Wait).unwrap(),
        TurnOutcome::Advanced { turn: 1 }
    );
}

#[test]
fn test_save_and_restore_round_trip() {
    let mut config = GameConfig::default();
    config.seed = 7;
    let mut world = GameWorld::new(config, AsciiLevels::new([DUNGEON])).unwrap();
    let mut scheduler = TurnScheduler::new();

    assert_eq!(
        scheduler.submit(&mut world, Intent::SaveGame).unwrap(),
        TurnOutcome::Meta(MetaCommand::Save)
    );
    let saved = world.snapshot();
    let turn = world.turn();
    let start = world.player_position().unwrap();

    for _ in 0..3 {
        if scheduler.submit(&mut world, Intent::Wait).is_err() {
            break;
        }
    }
    world.restore(&saved).unwrap();
    scheduler.sync(&world);

    assert_eq!(world.turn(), turn);
    assert_eq!(world.player_position().unwrap(), start);
    assert!(world.store().verify_spatial_index().is_empty());
    assert_eq!(world.snapshot().store, saved.store);
}
