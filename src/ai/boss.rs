//! Boss: a shotgun shooter that teleports next to a distant player and
//! summons minions while engaged.

use std::f32::consts::TAU;

use bevy::prelude::*;
use rand::Rng;
use rand::rngs::StdRng;

use super::{
    Actor, AiConfig, AnimationState, EnemyKind, EnemyState, FirePattern, Navigation, ReloadTime,
    Scene, ranged,
};
use crate::navigation::Pathfinder;
use crate::spawn::spawn_enemy;

/// Landing spots rejected for overlapping an obstacle are re-rolled this many times.
const TELEPORT_ATTEMPTS: usize = 8;

/// Cooldowns of the boss's special abilities.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct BossTimers {
    pub teleport_ms: f32,
    pub minion_ms: f32,
}

impl BossTimers {
    /// Both abilities start on a full cooldown.
    #[must_use]
    pub const fn new(config: &AiConfig) -> Self {
        Self {
            teleport_ms: config.teleport_cooldown_ms,
            minion_ms: config.minion_cooldown_ms,
        }
    }
}

/// The boss-only components, borrowed together for one step.
pub(super) struct BossGear<'a> {
    pub reload: &'a mut ReloadTime,
    pub pattern: FirePattern,
    pub pathfinder: &'a mut Pathfinder,
    pub timers: &'a mut BossTimers,
}

/// Random point on an annulus around the origin.
fn ring_offset(rng: &mut StdRng, min_radius: f32, max_radius: f32) -> Vec2 {
    let angle = rng.random_range(0.0..TAU);
    let radius = if max_radius > min_radius {
        rng.random_range(min_radius..max_radius)
    } else {
        min_radius
    };
    Vec2::from_angle(angle) * radius
}

/// Clamp `spot` so a box of half extents `half` centered on it stays inside
/// `area`. An area narrower than the box pins that axis to the area's minimum
/// side.
fn keep_inside(spot: Vec2, half: Vec2, area: Rect) -> Vec2 {
    let low = area.min + half;
    let high = (area.max - half).max(low);
    spot.clamp(low, high)
}

/// Pick a landing spot between `min_distance_to_player` and half of
/// `tp_to_player_range` from the player, whose footprint misses every
/// obstacle. Spots are pulled back inside the navigation area before the
/// obstacle test. Falls back to the last roll when every attempt is
/// obstructed.
fn landing_spot(actor: &Actor, scene: &Scene, area: Rect, rng: &mut StdRng) -> Vec2 {
    let config = scene.config;
    let half = actor.motion.scale.abs() / 2.0;
    let mut spot = keep_inside(scene.player_position, half, area);
    for _ in 0..TELEPORT_ATTEMPTS {
        let offset = ring_offset(
            rng,
            config.min_distance_to_player,
            config.tp_to_player_range / 2.0,
        );
        spot = keep_inside(scene.player_position + offset, half, area);
        let clear = scene.obstacles.iter().all(|obstacle| {
            spot.x + half.x <= obstacle.min.x
                || spot.x - half.x >= obstacle.max.x
                || spot.y + half.y <= obstacle.min.y
                || spot.y - half.y >= obstacle.max.y
        });
        if clear {
            break;
        }
    }
    spot
}

fn teleport(
    actor: &mut Actor,
    gear: &mut BossGear,
    scene: &Scene,
    area: Rect,
    rng: &mut StdRng,
) {
    let spot = landing_spot(actor, scene, area, rng);
    debug!(
        "Boss {} teleported from {} to {}",
        actor.entity,
        actor.position(),
        spot
    );
    actor.motion.position = spot;
    actor.motion.velocity = Vec2::ZERO;
    actor.face(scene.player_position - spot);
    *actor.state = EnemyState::Teleporting;
    *actor.animation = AnimationState::Teleporting;
    gear.pathfinder.clear();
    gear.timers.teleport_ms = scene.config.teleport_cooldown_ms;
}

/// Spawn a wave of minions around `center`, at least `minion_distance` away.
fn summon(
    center: Vec2,
    config: &AiConfig,
    rng: &mut StdRng,
    commands: &mut Commands,
) -> Vec<Entity> {
    (0..config.minions_per_spawn)
        .map(|_| {
            let offset = ring_offset(rng, config.minion_distance, config.minion_distance * 1.5);
            spawn_enemy(commands, EnemyKind::Minion, center + offset, config)
        })
        .collect()
}

/// One boss step. Teleports when the player is far and the cooldown allows,
/// otherwise behaves as a ranged enemy and summons minions while engaged.
pub(super) fn pursue(
    actor: &mut Actor,
    gear: &mut BossGear,
    scene: &Scene,
    navigation: &mut Navigation,
    rng: &mut StdRng,
    commands: &mut Commands,
) {
    let config = scene.config;
    let timers = &mut *gear.timers;
    timers.teleport_ms = (timers.teleport_ms - scene.elapsed_ms).max(0.0);
    timers.minion_ms = (timers.minion_ms - scene.elapsed_ms).max(0.0);

    let distance = scene.distance_to_player(actor.position());
    if gear.timers.teleport_ms <= 0.0 && distance > config.tp_to_player_range {
        gear.reload.relax(scene.elapsed_ms, config.take_aim_ms);
        teleport(actor, gear, scene, navigation.config.area, rng);
        return;
    }

    ranged::pursue(
        actor,
        gear.reload,
        gear.pattern,
        gear.pathfinder,
        scene,
        navigation,
        commands,
    );

    if *actor.state != EnemyState::Roaming && gear.timers.minion_ms <= 0.0 {
        let minions = summon(actor.position(), config, rng, commands);
        debug!("Boss {} summoned {} minions", actor.entity, minions.len());
        gear.timers.minion_ms = config.minion_cooldown_ms;
    }
}
