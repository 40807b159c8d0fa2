//! End-to-end runs of the AI and physics steps together.

use std::time::Duration;

use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use enemy_sim::ai::{AiConfig, AiRng, EnemyKind, EnemyState};
use enemy_sim::physics::{CollisionEvent, CollisionEvents, Motion, SpawnOrder};
use enemy_sim::spawn::{spawn_enemy, spawn_obstacle, spawn_player};
use pretty_assertions::assert_eq;

fn with_commands<R>(app: &mut App, build: impl FnOnce(&mut Commands) -> R) -> R {
    let mut queue = CommandQueue::default();
    let world = app.world_mut();
    let result = {
        let mut commands = Commands::new(&mut queue, world);
        build(&mut commands)
    };
    queue.apply(world);
    result
}

fn create_simulation_app(seed: u64) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
    app.insert_resource(AiRng::seeded(seed));
    app.add_plugins(enemy_sim::plugin);
    app.update();
    app
}

/// Walls, a player and one enemy of every kind. The boss abilities are off
/// cooldown so teleport and summoning both happen during the run.
fn populate_arena(app: &mut App) {
    let config = AiConfig {
        initial_reload_ms: 200.0,
        teleport_cooldown_ms: 0.0,
        minion_cooldown_ms: 500.0,
        ..AiConfig::default()
    };
    app.insert_resource(config.clone());

    with_commands(app, |commands| {
        spawn_player(commands, Vec2::new(640.0, 360.0));
        spawn_obstacle(commands, Vec2::new(420.0, 360.0), Vec2::new(40.0, 260.0));
        spawn_obstacle(commands, Vec2::new(860.0, 200.0), Vec2::new(200.0, 40.0));
        spawn_enemy(commands, EnemyKind::Melee, Vec2::new(150.0, 360.0), &config);
        spawn_enemy(commands, EnemyKind::Ranged, Vec2::new(900.0, 100.0), &config);
        spawn_enemy(commands, EnemyKind::Boss, Vec2::new(100.0, 650.0), &config);
        spawn_enemy(commands, EnemyKind::Minion, Vec2::new(640.0, 600.0), &config);
    });
}

/// Every body's state in spawn order, plus the collision queue.
fn snapshot(app: &mut App) -> (Vec<(Entity, Motion)>, Vec<CollisionEvent>) {
    let mut query = app.world_mut().query::<(Entity, &SpawnOrder, &Motion)>();
    let mut ordered: Vec<(SpawnOrder, Entity, Motion)> = query
        .iter(app.world())
        .map(|(entity, order, motion)| (*order, entity, *motion))
        .collect();
    ordered.sort_by_key(|(order, ..)| *order);
    let bodies = ordered
        .into_iter()
        .map(|(_, entity, motion)| (entity, motion))
        .collect();
    let events = app
        .world()
        .resource::<CollisionEvents>()
        .iter()
        .copied()
        .collect();
    (bodies, events)
}

#[test]
fn identical_runs_produce_identical_worlds() {
    let mut first = create_simulation_app(99);
    let mut second = create_simulation_app(99);
    populate_arena(&mut first);
    populate_arena(&mut second);

    for _ in 0..300 {
        first.update();
        second.update();
    }

    let (first_bodies, first_events) = snapshot(&mut first);
    let (second_bodies, second_events) = snapshot(&mut second);
    assert_eq!(first_bodies.len(), second_bodies.len());
    for ((a_entity, a), (b_entity, b)) in first_bodies.iter().zip(&second_bodies) {
        assert_eq!(a_entity, b_entity);
        assert_eq!(a.position.x.to_bits(), b.position.x.to_bits());
        assert_eq!(a.position.y.to_bits(), b.position.y.to_bits());
    }
    assert_eq!(first_events, second_events);
}

#[test]
fn every_enemy_kind_runs_for_many_frames() {
    let mut app = create_simulation_app(5);
    populate_arena(&mut app);

    for _ in 0..600 {
        app.update();
    }

    let mut query = app.world_mut().query::<(&EnemyKind, &EnemyState)>();
    let kinds: Vec<EnemyKind> = query.iter(app.world()).map(|(kind, _)| *kind).collect();
    assert!(kinds.contains(&EnemyKind::Boss));
    assert!(
        kinds.iter().filter(|kind| **kind == EnemyKind::Minion).count() > 1,
        "the boss should have summoned minions"
    );
}

#[test]
fn velocity_written_by_ai_moves_the_enemy_in_the_same_frame() {
    let mut app = create_simulation_app(1);
    let config = AiConfig::default();
    let start = Vec2::new(300.0, 300.0);

    let minion = with_commands(&mut app, |commands| {
        spawn_player(commands, Vec2::new(600.0, 300.0));
        spawn_enemy(commands, EnemyKind::Minion, start, &config)
    });

    app.update();

    let motion = app.world().get::<Motion>(minion).unwrap();
    let expected = start + Vec2::X * config.melee_enemy_speed * 0.016;
    assert!(
        (motion.position - expected).length() < 1e-3,
        "expected {expected}, got {}",
        motion.position
    );
}
