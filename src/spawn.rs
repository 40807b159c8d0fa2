//! Entity creation. Each archetype is spawned in exactly one place, so the
//! set of components an enemy kind carries is defined here and nowhere else.

use bevy::prelude::*;

use crate::ai::{
    AiConfig, AnimationState, BossTimers, EnemyKind, EnemyState, FirePattern, MeleeAttack,
    Obstacle, Player, Projectile, ReloadTime,
};
use crate::navigation::Pathfinder;
use crate::physics::Motion;

// === Constants ===

/// Full extents of the player's box.
pub const PLAYER_SIZE: Vec2 = Vec2::splat(60.0);

// === Spawning ===

pub fn spawn_player(commands: &mut Commands, position: Vec2) -> Entity {
    commands
        .spawn((Name::new("Player"), Player, Motion::new(position, PLAYER_SIZE)))
        .id()
}

/// Static wall centered on `center` with full extents `size`.
pub fn spawn_obstacle(commands: &mut Commands, center: Vec2, size: Vec2) -> Entity {
    commands
        .spawn((Name::new("Obstacle"), Obstacle, Motion::new(center, size)))
        .id()
}

/// Spawn an enemy of `kind` with every component its behavior requires.
///
/// | kind   | extra components                                       |
/// |--------|--------------------------------------------------------|
/// | Melee  | `MeleeAttack`, `Pathfinder`                            |
/// | Ranged | `ReloadTime`, `FirePattern::Single`, `Pathfinder`      |
/// | Boss   | `ReloadTime`, `FirePattern::Shotgun`, `Pathfinder`, `BossTimers` |
/// | Minion | none                                                   |
pub fn spawn_enemy(
    commands: &mut Commands,
    kind: EnemyKind,
    position: Vec2,
    config: &AiConfig,
) -> Entity {
    let mut enemy = commands.spawn((
        Name::new(format!("{kind:?} enemy")),
        kind,
        EnemyState::Roaming,
        AnimationState::Idle,
        Motion::new(position, kind.size()),
    ));

    match kind {
        EnemyKind::Melee => {
            enemy.insert((MeleeAttack::new(config), Pathfinder::default()));
        }
        EnemyKind::Ranged => {
            enemy.insert((
                ReloadTime::new(config.initial_reload_ms),
                FirePattern::Single,
                Pathfinder::default(),
            ));
        }
        EnemyKind::Boss => {
            enemy.insert((
                ReloadTime::new(config.initial_reload_ms),
                FirePattern::Shotgun,
                Pathfinder::default(),
                BossTimers::new(config),
            ));
        }
        EnemyKind::Minion => {}
    }

    enemy.id()
}

/// Projectile leaving `origin` along the unit vector `heading`.
pub fn spawn_projectile(
    commands: &mut Commands,
    shooter: Entity,
    origin: Vec2,
    heading: Vec2,
    config: &AiConfig,
) -> Entity {
    let mut motion = Motion::new(origin, Vec2::splat(config.projectile_size))
        .with_velocity(heading * config.projectile_speed);
    motion.angle = heading.y.atan2(heading.x);
    commands
        .spawn((Name::new("Projectile"), Projectile { shooter }, motion))
        .id()
}
