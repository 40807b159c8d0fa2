//! Enemy AI: per-kind state machines that chase, shoot, strike, teleport and
//! summon, writing velocity, facing and animation state back to each enemy.
//!
//! The step runs once per frame in `SimulationSet::Ai`, before physics
//! integrates the velocities it writes.

mod boss;
mod melee;
mod ranged;
mod sight;
mod steering;

pub use boss::BossTimers;
pub use melee::{MeleeAttack, MeleeHit, MeleeHits, MeleePhase};
pub use ranged::{FirePattern, Projectile, ReloadPhase, ReloadTime, volley_directions};
pub use sight::line_of_sight;

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::SimulationSet;
use crate::geometry::{DIRECTION_EPSILON, direction, motion_aabb};
use crate::navigation::{GridMap, NavGridConfig, Pathfinder};
use crate::physics::{Motion, SpawnOrder};

// === Constants ===

const RANGED_ENEMY_SPEED: f32 = 125.0;
const MELEE_ENEMY_SPEED: f32 = 175.0;
/// Share of the new steering velocity blended in each step.
const FOLLOWING_CONSTANT: f32 = 0.4;
/// Obstacles closer than this push context-steered enemies away.
const DISTANCE_TO_WALLS: f32 = 150.0;
const AGGRO_DISTANCE: f32 = 400.0;
/// Reload countdown a freshly spawned shooter starts with.
const INITIAL_RELOAD_MS: f32 = 3000.0;
const TAKE_AIM_MS: f32 = 500.0;
const SHOOT_RATE_MS: f32 = 500.0;
const OBSTACLE_FORCE: f32 = 25.0;
const ENEMY_FORCE: f32 = 20.0;
/// Ranged enemies back off when the player gets closer than this.
const MIN_DISTANCE_TO_PLAYER: f32 = 80.0;
const MELEE_DISTANCE: f32 = 100.0;
/// Gap between enemy boxes below which enemies push each other apart.
const DISTANCE_BETWEEN_ENEMIES: f32 = 30.0;
const LOS_INCREMENT: f32 = 50.0;
const SHOTGUN_ANGLE: f32 = std::f32::consts::PI / 8.0;
/// Bosses only teleport when the player is farther away than this.
const TP_TO_PLAYER_RANGE: f32 = 300.0;
const MINION_DISTANCE: f32 = 90.0;
/// AI frames between path searches for one enemy.
const A_STAR_FRAME_UPDATES: u32 = 100;
const RANGED_ATTACK_DISTANCE: f32 = 300.0;
const PROJECTILE_SPEED: f32 = 300.0;
const PROJECTILE_SIZE: f32 = 12.0;
const MELEE_WINDUP_MS: f32 = 300.0;
const MELEE_RECOVERY_MS: f32 = 700.0;
const TELEPORT_COOLDOWN_MS: f32 = 4000.0;
const MINION_COOLDOWN_MS: f32 = 6000.0;
const MINIONS_PER_SPAWN: u32 = 3;
/// Target movement beyond this forces a new path search ahead of schedule.
const PATH_DRIFT_THRESHOLD: f32 = 100.0;
const WAYPOINT_REACH_DISTANCE: f32 = 25.0;
const BEZIER_BLEND_MS: f32 = 800.0;

// === Components ===

/// Marker for the player, the single target every enemy pursues.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Marker for static obstacles: block sight, repel steering, shape the path grid.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Obstacle;

/// Which behavior drives an enemy. Also marks the entity as an enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
#[reflect(Component)]
pub enum EnemyKind {
    /// Closes in and strikes at short range.
    Melee,
    /// Keeps its distance and shoots when it has a clear shot.
    Ranged,
    /// Shotgun shooter that teleports to the player and summons minions.
    Boss,
    /// Cheap summoned chaser with no obstacle awareness.
    Minion,
}

impl EnemyKind {
    /// All enemy kinds, for iteration.
    pub const ALL: [Self; 4] = [Self::Melee, Self::Ranged, Self::Boss, Self::Minion];

    #[must_use]
    pub const fn speed(self, config: &AiConfig) -> f32 {
        match self {
            Self::Melee | Self::Minion => config.melee_enemy_speed,
            Self::Ranged | Self::Boss => config.ranged_enemy_speed,
        }
    }

    /// Full extents of the enemy's box.
    #[must_use]
    pub const fn size(self) -> Vec2 {
        match self {
            Self::Melee | Self::Ranged => Vec2::splat(60.0),
            Self::Boss => Vec2::splat(120.0),
            Self::Minion => Vec2::splat(40.0),
        }
    }
}

/// Current branch of an enemy's state machine.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum EnemyState {
    /// Player out of aggro range.
    #[default]
    Roaming,
    /// Pursuing the player.
    Aggro,
    /// In range (and, for shooters, in sight): standing still to shoot or strike.
    Attacking,
    /// Backing away from a player who got too close.
    Fleeing,
    /// Relocated next to the player this step.
    Teleporting,
}

/// Animation the renderer should play for an enemy.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum AnimationState {
    #[default]
    Idle,
    Walking,
    Aiming,
    Striking,
    Teleporting,
}

// === Resources ===

/// Tuning for every enemy behavior.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct AiConfig {
    pub ranged_enemy_speed: f32,
    pub melee_enemy_speed: f32,
    pub following_constant: f32,
    pub distance_to_walls: f32,
    pub aggro_distance: f32,
    pub initial_reload_ms: f32,
    pub take_aim_ms: f32,
    pub shoot_rate_ms: f32,
    pub obstacle_force: f32,
    pub enemy_force: f32,
    pub min_distance_to_player: f32,
    pub melee_distance: f32,
    pub distance_between_enemies: f32,
    pub los_increment: f32,
    /// Angle between neighboring pellets of a shotgun volley (radians).
    pub shotgun_angle: f32,
    pub tp_to_player_range: f32,
    pub minion_distance: f32,
    pub a_star_frame_updates: u32,
    pub ranged_attack_distance: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,
    pub melee_windup_ms: f32,
    pub melee_recovery_ms: f32,
    pub teleport_cooldown_ms: f32,
    pub minion_cooldown_ms: f32,
    pub minions_per_spawn: u32,
    pub path_drift_threshold: f32,
    pub waypoint_reach_distance: f32,
    pub bezier_blend_ms: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            ranged_enemy_speed: RANGED_ENEMY_SPEED,
            melee_enemy_speed: MELEE_ENEMY_SPEED,
            following_constant: FOLLOWING_CONSTANT,
            distance_to_walls: DISTANCE_TO_WALLS,
            aggro_distance: AGGRO_DISTANCE,
            initial_reload_ms: INITIAL_RELOAD_MS,
            take_aim_ms: TAKE_AIM_MS,
            shoot_rate_ms: SHOOT_RATE_MS,
            obstacle_force: OBSTACLE_FORCE,
            enemy_force: ENEMY_FORCE,
            min_distance_to_player: MIN_DISTANCE_TO_PLAYER,
            melee_distance: MELEE_DISTANCE,
            distance_between_enemies: DISTANCE_BETWEEN_ENEMIES,
            los_increment: LOS_INCREMENT,
            shotgun_angle: SHOTGUN_ANGLE,
            tp_to_player_range: TP_TO_PLAYER_RANGE,
            minion_distance: MINION_DISTANCE,
            a_star_frame_updates: A_STAR_FRAME_UPDATES,
            ranged_attack_distance: RANGED_ATTACK_DISTANCE,
            projectile_speed: PROJECTILE_SPEED,
            projectile_size: PROJECTILE_SIZE,
            melee_windup_ms: MELEE_WINDUP_MS,
            melee_recovery_ms: MELEE_RECOVERY_MS,
            teleport_cooldown_ms: TELEPORT_COOLDOWN_MS,
            minion_cooldown_ms: MINION_COOLDOWN_MS,
            minions_per_spawn: MINIONS_PER_SPAWN,
            path_drift_threshold: PATH_DRIFT_THRESHOLD,
            waypoint_reach_distance: WAYPOINT_REACH_DISTANCE,
            bezier_blend_ms: BEZIER_BLEND_MS,
        }
    }
}

/// The one random generator the AI draws from (teleport and minion offsets).
/// Seeded once; insert [`AiRng::seeded`] before the plugin for reproducible runs.
#[derive(Resource, Debug, Deref, DerefMut)]
pub struct AiRng(StdRng);

impl AiRng {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for AiRng {
    fn default() -> Self {
        Self(StdRng::from_os_rng())
    }
}

// === Errors ===

/// Spawn code broke the component contract for an enemy kind. Never
/// recoverable: the step aborts and Bevy's error handler reports it.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{kind:?} enemy {entity} is missing its {component} component")]
    MissingComponent {
        entity: Entity,
        kind: EnemyKind,
        component: &'static str,
    },
}

fn require<T>(
    component: Option<T>,
    entity: Entity,
    kind: EnemyKind,
    name: &'static str,
) -> Result<T, AiError> {
    component.ok_or(AiError::MissingComponent {
        entity,
        kind,
        component: name,
    })
}

// === Step Context ===

/// Another enemy, as seen by context steering.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    entity: Entity,
    position: Vec2,
    extents: Vec2,
}

/// Everything an enemy may react to during one AI step.
struct Scene<'a> {
    config: &'a AiConfig,
    elapsed_ms: f32,
    player: Entity,
    player_position: Vec2,
    obstacles: &'a [Aabb2d],
    enemies: &'a [Neighbor],
}

impl Scene<'_> {
    fn distance_to_player(&self, position: Vec2) -> f32 {
        position.distance(self.player_position)
    }

    fn has_line_of_sight(&self, position: Vec2) -> bool {
        line_of_sight(
            position,
            self.player_position,
            self.obstacles,
            self.config.los_increment,
        )
    }
}

/// Path grid for the current step, built on first use and shared by every
/// search in the step.
struct Navigation<'a> {
    config: &'a NavGridConfig,
    obstacles: &'a [Aabb2d],
    grid: Option<GridMap>,
}

impl Navigation<'_> {
    fn grid(&mut self) -> &mut GridMap {
        self.grid
            .get_or_insert_with(|| GridMap::build(self.config, self.obstacles))
    }
}

/// The enemy being updated, with the components every kind carries.
struct Actor<'a> {
    entity: Entity,
    kind: EnemyKind,
    motion: &'a mut Motion,
    state: &'a mut EnemyState,
    animation: &'a mut AnimationState,
}

impl Actor<'_> {
    const fn speed(&self, config: &AiConfig) -> f32 {
        self.kind.speed(config)
    }

    fn position(&self) -> Vec2 {
        self.motion.position
    }

    /// Point the enemy along `heading`: rotation follows it, and the sprite
    /// flips to face its horizontal component.
    fn face(&mut self, heading: Vec2) {
        let Some(dir) = direction(heading) else {
            return;
        };
        self.motion.angle = dir.y.atan2(dir.x);
        if dir.x.abs() > DIRECTION_EPSILON {
            self.motion.scale.x = self.motion.scale.x.abs().copysign(dir.x);
        }
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.motion.velocity = velocity;
        self.face(velocity);
    }

    /// Player out of range: stand still.
    fn roam(&mut self) {
        *self.state = EnemyState::Roaming;
        *self.animation = AnimationState::Idle;
        self.motion.velocity = Vec2::ZERO;
    }
}

// === Systems ===

/// One AI step: every enemy, in spawn order, runs the behavior for its kind.
///
/// Returns an error (fatal under the default handler) when an enemy lacks a
/// component its kind requires.
pub fn ai_step(
    time: Res<Time>,
    config: Res<AiConfig>,
    grid_config: Res<NavGridConfig>,
    player: Option<Single<(Entity, &Motion), (With<Player>, Without<EnemyKind>)>>,
    obstacles: Query<(&SpawnOrder, &Motion), (With<Obstacle>, Without<EnemyKind>)>,
    mut enemies: Query<(
        Entity,
        &EnemyKind,
        Option<&SpawnOrder>,
        Option<&mut Motion>,
        Option<&mut EnemyState>,
        Option<&mut AnimationState>,
        Option<&mut ReloadTime>,
        Option<&FirePattern>,
        Option<&mut MeleeAttack>,
        Option<&mut Pathfinder>,
        Option<&mut BossTimers>,
    )>,
    mut rng: ResMut<AiRng>,
    mut melee_hits: ResMut<MeleeHits>,
    mut commands: Commands,
) -> Result {
    let Some(player) = player else {
        return Ok(());
    };
    let (player_entity, player_motion) = *player;

    let mut obstacle_boxes: Vec<(SpawnOrder, Aabb2d)> = obstacles
        .iter()
        .map(|(order, motion)| (*order, motion_aabb(motion)))
        .collect();
    obstacle_boxes.sort_by_key(|(order, _)| *order);
    let obstacle_boxes: Vec<Aabb2d> = obstacle_boxes.into_iter().map(|(_, aabb)| aabb).collect();

    let mut roster = Vec::new();
    for (entity, kind, order, motion, ..) in &enemies {
        let order = require(order, entity, *kind, "SpawnOrder")?;
        let motion = require(motion, entity, *kind, "Motion")?;
        roster.push((
            *order,
            Neighbor {
                entity,
                position: motion.position,
                extents: motion.scale.abs(),
            },
        ));
    }
    roster.sort_by_key(|(order, _)| *order);
    let neighbors: Vec<Neighbor> = roster.into_iter().map(|(_, neighbor)| neighbor).collect();

    let scene = Scene {
        config: &config,
        elapsed_ms: time.delta_secs() * 1000.0,
        player: player_entity,
        player_position: player_motion.position,
        obstacles: &obstacle_boxes,
        enemies: &neighbors,
    };
    let mut navigation = Navigation {
        config: &grid_config,
        obstacles: &obstacle_boxes,
        grid: None,
    };

    for neighbor in &neighbors {
        let (entity, kind, _, motion, state, animation, reload, pattern, melee, pathfinder, timers) =
            enemies.get_mut(neighbor.entity)?;
        let kind = *kind;
        let mut motion = require(motion, entity, kind, "Motion")?;
        let mut state = require(state, entity, kind, "EnemyState")?;
        let mut animation = require(animation, entity, kind, "AnimationState")?;
        let mut actor = Actor {
            entity,
            kind,
            motion: &mut motion,
            state: &mut state,
            animation: &mut animation,
        };

        match kind {
            EnemyKind::Minion => steering::minion_chase(&mut actor, &scene),
            EnemyKind::Melee => {
                let mut attack = require(melee, entity, kind, "MeleeAttack")?;
                let mut pathfinder = require(pathfinder, entity, kind, "Pathfinder")?;
                melee::pursue(
                    &mut actor,
                    &mut attack,
                    &mut pathfinder,
                    &scene,
                    &mut navigation,
                    &mut melee_hits,
                );
            }
            EnemyKind::Ranged => {
                let mut reload = require(reload, entity, kind, "ReloadTime")?;
                let pattern = require(pattern, entity, kind, "FirePattern")?;
                let mut pathfinder = require(pathfinder, entity, kind, "Pathfinder")?;
                ranged::pursue(
                    &mut actor,
                    &mut reload,
                    *pattern,
                    &mut pathfinder,
                    &scene,
                    &mut navigation,
                    &mut commands,
                );
            }
            EnemyKind::Boss => {
                let mut reload = require(reload, entity, kind, "ReloadTime")?;
                let pattern = require(pattern, entity, kind, "FirePattern")?;
                let mut pathfinder = require(pathfinder, entity, kind, "Pathfinder")?;
                let mut timers = require(timers, entity, kind, "BossTimers")?;
                boss::pursue(
                    &mut actor,
                    &mut boss::BossGear {
                        reload: &mut reload,
                        pattern: *pattern,
                        pathfinder: &mut pathfinder,
                        timers: &mut timers,
                    },
                    &scene,
                    &mut navigation,
                    &mut rng,
                    &mut commands,
                );
            }
        }
    }

    Ok(())
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Player>()
        .register_type::<Obstacle>()
        .register_type::<EnemyKind>()
        .register_type::<EnemyState>()
        .register_type::<AnimationState>()
        .register_type::<ReloadTime>()
        .register_type::<FirePattern>()
        .register_type::<Projectile>()
        .register_type::<MeleeAttack>()
        .register_type::<MeleeHits>()
        .register_type::<BossTimers>()
        .register_type::<AiConfig>()
        .init_resource::<AiConfig>()
        .init_resource::<AiRng>()
        .init_resource::<MeleeHits>();

    app.add_systems(Update, ai_step.in_set(SimulationSet::Ai));
}
