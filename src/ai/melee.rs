//! Melee enemies: close in, wind up, strike.

use bevy::prelude::*;

use super::{Actor, AiConfig, AnimationState, EnemyState, Navigation, Scene, steering};
use crate::navigation::Pathfinder;

/// Which half of the strike cycle a melee enemy is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum MeleePhase {
    /// Building up to a strike; the hit lands when the counter runs out.
    WindUp,
    /// Recovering after a strike.
    Recovery,
}

/// Strike timer of a melee enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct MeleeAttack {
    pub counter_ms: f32,
    pub phase: MeleePhase,
}

impl MeleeAttack {
    #[must_use]
    pub const fn new(config: &AiConfig) -> Self {
        Self {
            counter_ms: config.melee_windup_ms,
            phase: MeleePhase::WindUp,
        }
    }

    /// Advance the cycle while in range. Returns `true` on the step a strike lands.
    pub fn tick(&mut self, elapsed_ms: f32, windup_ms: f32, recovery_ms: f32) -> bool {
        self.counter_ms -= elapsed_ms;
        if self.counter_ms > 0.0 {
            return false;
        }
        match self.phase {
            MeleePhase::WindUp => {
                self.phase = MeleePhase::Recovery;
                self.counter_ms = recovery_ms;
                true
            }
            MeleePhase::Recovery => {
                self.phase = MeleePhase::WindUp;
                self.counter_ms = windup_ms;
                false
            }
        }
    }

    /// Advance the cycle out of range: recovery keeps running, a wind-up is
    /// cancelled and starts over next time.
    pub fn relax(&mut self, elapsed_ms: f32, windup_ms: f32) {
        match self.phase {
            MeleePhase::Recovery => {
                self.counter_ms -= elapsed_ms;
                if self.counter_ms <= 0.0 {
                    self.phase = MeleePhase::WindUp;
                    self.counter_ms = windup_ms;
                }
            }
            MeleePhase::WindUp => self.counter_ms = windup_ms,
        }
    }
}

/// A strike that landed on `target` this step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct MeleeHit {
    pub attacker: Entity,
    pub target: Entity,
}

/// Strikes recorded by the AI step. Damage is applied downstream, which
/// drains the queue.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct MeleeHits {
    hits: Vec<MeleeHit>,
}

impl MeleeHits {
    pub fn push(&mut self, attacker: Entity, target: Entity) {
        self.hits.push(MeleeHit { attacker, target });
    }

    pub fn iter(&self) -> impl Iterator<Item = &MeleeHit> {
        self.hits.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = MeleeHit> + '_ {
        self.hits.drain(..)
    }
}

/// Plant feet, face the player, run the strike cycle.
fn strike(actor: &mut Actor, attack: &mut MeleeAttack, scene: &Scene, hits: &mut MeleeHits) {
    let config = scene.config;
    *actor.state = EnemyState::Attacking;
    actor.motion.velocity = Vec2::ZERO;
    actor.face(scene.player_position - actor.position());

    if attack.tick(scene.elapsed_ms, config.melee_windup_ms, config.melee_recovery_ms) {
        debug!("Enemy {} struck the player", actor.entity);
        hits.push(actor.entity, scene.player);
    }
    *actor.animation = match attack.phase {
        MeleePhase::WindUp => AnimationState::Striking,
        MeleePhase::Recovery => AnimationState::Idle,
    };
}

/// One step of the melee state machine: idle out of aggro range, strike in
/// melee range, pursue in between.
pub(super) fn pursue(
    actor: &mut Actor,
    attack: &mut MeleeAttack,
    pathfinder: &mut Pathfinder,
    scene: &Scene,
    navigation: &mut Navigation,
    hits: &mut MeleeHits,
) {
    let config = scene.config;
    let distance = scene.distance_to_player(actor.position());

    if distance > config.aggro_distance {
        attack.relax(scene.elapsed_ms, config.melee_windup_ms);
        actor.roam();
    } else if distance <= config.melee_distance {
        strike(actor, attack, scene, hits);
    } else {
        attack.relax(scene.elapsed_ms, config.melee_windup_ms);
        let in_sight = scene.has_line_of_sight(actor.position());
        steering::pursue(actor, pathfinder, scene, navigation, in_sight);
    }
}
