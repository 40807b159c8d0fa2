//! Headless demo: builds a small arena and steps the simulation at a fixed
//! 16 ms frame, logging what the enemies do.
//!
//! Usage: `enemy-sim [FRAMES] [SEED]`

use std::time::Duration;

use bevy::log::LogPlugin;
use bevy::time::TimeUpdateStrategy;
use enemy_sim::prelude::*;
use enemy_sim::spawn::PLAYER_SIZE;

const DEFAULT_FRAMES: u32 = 600;
const DEFAULT_SEED: u64 = 42;
const FRAME: Duration = Duration::from_millis(16);

const PLAYER_START: Vec2 = Vec2::new(640.0, 360.0);

/// The player paces between these x coordinates.
const PATROL_MIN_X: f32 = 200.0;
const PATROL_MAX_X: f32 = 1080.0;
const PATROL_SPEED: f32 = 90.0;

fn spawn_arena(mut commands: Commands, config: Res<AiConfig>) {
    let player = spawn_player(&mut commands, PLAYER_START);
    commands.entity(player).insert(
        Motion::new(PLAYER_START, PLAYER_SIZE).with_velocity(Vec2::X * PATROL_SPEED),
    );

    spawn_obstacle(&mut commands, Vec2::new(420.0, 360.0), Vec2::new(40.0, 260.0));
    spawn_obstacle(&mut commands, Vec2::new(860.0, 200.0), Vec2::new(200.0, 40.0));

    spawn_enemy(&mut commands, EnemyKind::Melee, Vec2::new(150.0, 360.0), &config);
    spawn_enemy(&mut commands, EnemyKind::Melee, Vec2::new(1100.0, 600.0), &config);
    spawn_enemy(&mut commands, EnemyKind::Ranged, Vec2::new(900.0, 100.0), &config);
    spawn_enemy(&mut commands, EnemyKind::Boss, Vec2::new(100.0, 650.0), &config);
    info!("Arena ready");
}

/// Turn the player around at the ends of its patrol.
fn patrol(mut player: Single<&mut Motion, With<Player>>) {
    let x = player.position.x;
    let heading = player.velocity.x;
    if (x > PATROL_MAX_X && heading > 0.0) || (x < PATROL_MIN_X && heading < 0.0) {
        player.velocity.x = -player.velocity.x;
    }
}

/// Consume this frame's events the way gameplay would.
fn report(
    mut collisions: ResMut<CollisionEvents>,
    mut hits: ResMut<MeleeHits>,
    enemies: Query<(&EnemyKind, &EnemyState)>,
    mut frame: Local<u32>,
) {
    *frame += 1;
    for hit in hits.drain() {
        info!("Frame {}: {} struck {}", *frame, hit.attacker, hit.target);
    }
    let contacts = collisions.drain().count();
    if contacts > 0 {
        debug!("Frame {}: {contacts} collision records", *frame);
    }
    if *frame % 60 == 0 {
        for (kind, state) in &enemies {
            info!("Frame {}: {kind:?} is {state:?}", *frame);
        }
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let frames = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_FRAMES);
    let seed = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_SEED);

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()))
        .insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .insert_resource(AiRng::seeded(seed))
        .add_plugins(enemy_sim::plugin)
        .add_systems(Startup, spawn_arena)
        .add_systems(Update, patrol.before(SimulationSet::Ai))
        .add_systems(Update, report.after(SimulationSet::Physics));

    for _ in 0..frames {
        app.update();
    }
    info!("Simulated {frames} frames");
}
