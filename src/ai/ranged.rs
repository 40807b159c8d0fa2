//! Ranged enemies: keep distance, aim, fire volleys of projectiles.

use bevy::prelude::*;

use super::{Actor, AiConfig, AnimationState, EnemyState, Navigation, Scene, steering};
use crate::geometry::direction;
use crate::navigation::Pathfinder;
use crate::spawn::spawn_projectile;

// === Components ===

/// Which half of the fire cycle a shooter is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum ReloadPhase {
    /// Standing still with the player in sight; fires when the counter runs out.
    Aiming,
    /// Recovering from the last volley.
    Cooldown,
}

/// Fire-control timer of a shooter.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ReloadTime {
    /// Milliseconds left in the current phase.
    pub counter_ms: f32,
    pub phase: ReloadPhase,
}

impl ReloadTime {
    /// Shooter that must wait `initial_ms` before it can start aiming.
    #[must_use]
    pub const fn new(initial_ms: f32) -> Self {
        Self {
            counter_ms: initial_ms,
            phase: ReloadPhase::Cooldown,
        }
    }

    /// Advance the cycle while attacking. Returns `true` on the step the aim
    /// completes and a volley should leave.
    pub fn tick(&mut self, elapsed_ms: f32, take_aim_ms: f32, shoot_rate_ms: f32) -> bool {
        self.counter_ms -= elapsed_ms;
        if self.counter_ms > 0.0 {
            return false;
        }
        match self.phase {
            ReloadPhase::Cooldown => {
                self.phase = ReloadPhase::Aiming;
                self.counter_ms = take_aim_ms;
                false
            }
            ReloadPhase::Aiming => {
                self.phase = ReloadPhase::Cooldown;
                self.counter_ms = shoot_rate_ms;
                true
            }
        }
    }

    /// Advance the cycle while not attacking: cooldown keeps running, an
    /// interrupted aim starts over.
    pub fn relax(&mut self, elapsed_ms: f32, take_aim_ms: f32) {
        match self.phase {
            ReloadPhase::Cooldown => self.counter_ms = (self.counter_ms - elapsed_ms).max(0.0),
            ReloadPhase::Aiming => self.counter_ms = take_aim_ms,
        }
    }
}

/// Shape of a volley.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum FirePattern {
    #[default]
    Single,
    /// Three pellets fanned around the aim direction.
    Shotgun,
}

/// A shot in flight, remembering who fired it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub shooter: Entity,
}

/// Unit directions of the projectiles in one volley aimed along `aim`.
#[must_use]
pub fn volley_directions(aim: Vec2, pattern: FirePattern, spread: f32) -> Vec<Vec2> {
    match pattern {
        FirePattern::Single => vec![aim],
        FirePattern::Shotgun => [-spread, 0.0, spread]
            .into_iter()
            .map(|angle| Vec2::from_angle(angle).rotate(aim))
            .collect(),
    }
}

// === Behavior ===

fn fire(
    actor: &Actor,
    aim: Vec2,
    pattern: FirePattern,
    config: &AiConfig,
    commands: &mut Commands,
) {
    let directions = volley_directions(aim, pattern, config.shotgun_angle);
    trace!(
        "Enemy {} fired {} projectile(s)",
        actor.entity,
        directions.len()
    );
    for heading in directions {
        spawn_projectile(commands, actor.entity, actor.position(), heading, config);
    }
}

/// Stand still facing the player and run the fire cycle.
fn stop_and_shoot(
    actor: &mut Actor,
    reload: &mut ReloadTime,
    pattern: FirePattern,
    scene: &Scene,
    commands: &mut Commands,
) {
    let config = scene.config;
    *actor.state = EnemyState::Attacking;
    actor.motion.velocity = Vec2::ZERO;

    let aim = direction(scene.player_position - actor.position());
    if let Some(aim) = aim {
        actor.face(aim);
    }

    let fired = reload.tick(scene.elapsed_ms, config.take_aim_ms, config.shoot_rate_ms);
    if let Some(aim) = aim.filter(|_| fired) {
        fire(actor, aim, pattern, config, commands);
    }
    *actor.animation = match reload.phase {
        ReloadPhase::Aiming => AnimationState::Aiming,
        ReloadPhase::Cooldown => AnimationState::Idle,
    };
}

/// Back straight away from the player.
fn flee(actor: &mut Actor, scene: &Scene) {
    *actor.state = EnemyState::Fleeing;
    *actor.animation = AnimationState::Walking;
    let velocity = direction(actor.position() - scene.player_position)
        .map_or(Vec2::ZERO, |dir| dir * actor.speed(scene.config));
    actor.set_velocity(velocity);
}

/// One step of the ranged state machine.
///
/// Out of aggro range the enemy idles. With the player in sight it flees
/// when crowded and shoots when in range; otherwise it pursues.
pub(super) fn pursue(
    actor: &mut Actor,
    reload: &mut ReloadTime,
    pattern: FirePattern,
    pathfinder: &mut Pathfinder,
    scene: &Scene,
    navigation: &mut Navigation,
    commands: &mut Commands,
) {
    let config = scene.config;
    let distance = scene.distance_to_player(actor.position());

    if distance > config.aggro_distance {
        reload.relax(scene.elapsed_ms, config.take_aim_ms);
        actor.roam();
        return;
    }

    let in_sight = scene.has_line_of_sight(actor.position());
    if in_sight && distance < config.min_distance_to_player {
        reload.relax(scene.elapsed_ms, config.take_aim_ms);
        flee(actor, scene);
    } else if in_sight && distance <= config.ranged_attack_distance {
        stop_and_shoot(actor, reload, pattern, scene, commands);
    } else {
        reload.relax(scene.elapsed_ms, config.take_aim_ms);
        steering::pursue(actor, pathfinder, scene, navigation, in_sight);
    }
}
