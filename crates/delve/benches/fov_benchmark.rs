//! # Visibility and Pathfinding Benchmark
//!
//! Field of view and A* over a large level with scattered pillars, plus a
//! full world turn with a crowd of monsters.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use delve::core::{LocationKey, TileKind};
use delve::{find_path, fov, prefabs, GameConfig, GameWorld, Intent, LevelData, TurnScheduler};

const SIDE: i32 = 120;

/// Open level with a pillar every seventh cell.
fn pillared_world() -> GameWorld {
    let mut data = LevelData::filled(-1, SIDE, SIDE, TileKind::Floor);
    for y in (3..SIDE).step_by(7) {
        for x in (3..SIDE).step_by(7) {
            data.set(x, y, TileKind::Wall);
        }
    }
    let mut config = GameConfig::default();
    config.ai.activate_only_visible = false;
    let mut world = GameWorld::empty(config);
    world.add_level(&data).expect("bench setup");
    world
        .spawn_player(LocationKey::new(SIDE / 2, SIDE / 2, -1))
        .expect("bench setup");
    world
}

fn bench_fov(c: &mut Criterion) {
    let world = pillared_world();
    let origin = LocationKey::new(SIDE / 2, SIDE / 2, -1);
    let mut group = c.benchmark_group("fov");

    for radius in [8, 16, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, &radius| {
            b.iter(|| black_box(fov::compute_visible(world.store(), origin, radius).len()));
        });
    }

    group.finish();
}

fn bench_path(c: &mut Criterion) {
    let world = pillared_world();
    let bounds = world.bounds(-1).expect("bench setup");

    c.bench_function("astar_corner_to_corner", |b| {
        b.iter(|| {
            let route = find_path(
                world.store(),
                bounds,
                LocationKey::new(0, 0, -1),
                LocationKey::new(SIDE - 1, SIDE - 1, -1),
            );
            black_box(route.len())
        });
    });
}

fn bench_world_turn(c: &mut Criterion) {
    c.bench_function("world_turn_50_monsters", |b| {
        b.iter_batched(
            || {
                let mut world = pillared_world();
                for i in 0..50 {
                    let at = LocationKey::new((i * 11) % SIDE, (i * 17) % SIDE, -1);
                    if world.terrain_at(at) == Some(TileKind::Floor) {
                        prefabs::goblin(world.store_mut(), at).expect("bench setup");
                    }
                }
                (world, TurnScheduler::new())
            },
            |(mut world, mut scheduler)| black_box(scheduler.submit(&mut world, Intent::Wait)),
            criterion::BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_fov, bench_path, bench_world_turn);
criterion_main!(benches);
