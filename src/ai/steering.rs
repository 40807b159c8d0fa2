//! Movement toward the player: plain chase, context steering, and the
//! planned-route pursuit shared by melee, ranged and boss enemies.

use bevy::prelude::*;

use super::{Actor, AnimationState, EnemyState, Navigation, Scene};
use crate::geometry::{closest_point, direction};
use crate::navigation::{PathFollowing, Pathfinder, plan_path};

/// Minions ignore walls and other enemies: straight at the player inside
/// aggro range, idle outside it.
pub(super) fn minion_chase(actor: &mut Actor, scene: &Scene) {
    let position = actor.position();
    if scene.distance_to_player(position) > scene.config.aggro_distance {
        actor.roam();
        return;
    }
    *actor.state = EnemyState::Aggro;
    *actor.animation = AnimationState::Walking;
    let velocity = direction(scene.player_position - position)
        .map_or(Vec2::ZERO, |dir| dir * actor.speed(scene.config));
    actor.set_velocity(velocity);
}

/// Sum of attraction toward the player and repulsion from nearby obstacles
/// and other enemies, normalized. `None` when the forces cancel out.
///
/// Repulsion falls off with the inverse of distance: obstacles count inside
/// `distance_to_walls` of their closest point, enemies inside
/// `distance_between_enemies` beyond touching.
pub(super) fn context_direction(actor: &Actor, scene: &Scene) -> Option<Vec2> {
    let config = scene.config;
    let position = actor.position();
    let extents = actor.motion.scale.abs();
    let mut steering = direction(scene.player_position - position).unwrap_or(Vec2::ZERO);

    for obstacle in scene.obstacles {
        let away = position - closest_point(obstacle, position);
        let distance = away.length();
        if distance >= config.distance_to_walls {
            continue;
        }
        if let Some(dir) = direction(away) {
            steering += dir * (config.obstacle_force / distance);
        }
    }

    for neighbor in scene.enemies {
        if neighbor.entity == actor.entity {
            continue;
        }
        let away = position - neighbor.position;
        let distance = away.length();
        let touching = (extents.max_element() + neighbor.extents.max_element()) / 2.0;
        if distance >= touching + config.distance_between_enemies {
            continue;
        }
        if let Some(dir) = direction(away) {
            steering += dir * (config.enemy_force / distance);
        }
    }

    direction(steering)
}

/// Blend the context-steered velocity into the current one.
fn context_chase(actor: &mut Actor, scene: &Scene) {
    let config = scene.config;
    let desired = context_direction(actor, scene)
        .map_or(Vec2::ZERO, |dir| dir * actor.speed(config));
    let velocity = actor
        .motion
        .velocity
        .lerp(desired, config.following_constant);
    actor.set_velocity(velocity);
}

/// Follow the cached route, searching again when the throttle allows.
/// Returns `false` when there is no route to follow.
fn route_chase(
    actor: &mut Actor,
    pathfinder: &mut Pathfinder,
    scene: &Scene,
    navigation: &mut Navigation,
) -> bool {
    let config = scene.config;
    let target = scene.player_position;

    if pathfinder.should_replan(target, config.path_drift_threshold) {
        match plan_path(navigation.grid(), actor.position(), target) {
            Ok(route) => {
                trace!(
                    "Enemy {} planned {} waypoints to the player",
                    actor.entity,
                    route.len()
                );
                pathfinder.set_route(route, target, config.a_star_frame_updates);
            }
            Err(error) => {
                debug!("Enemy {} has no route to the player: {error}", actor.entity);
                pathfinder.set_unreachable(target, config.a_star_frame_updates);
            }
        }
    }
    pathfinder.tick();

    let following = PathFollowing {
        speed: actor.speed(config),
        reach_distance: config.waypoint_reach_distance,
        blend_ms: config.bezier_blend_ms,
    };
    let Some(velocity) = pathfinder.steer(actor.position(), target, following, scene.elapsed_ms)
    else {
        return false;
    };
    actor.set_velocity(velocity);
    true
}

/// Aggro pursuit: context steering while the player is in sight, the planned
/// route while it is not, and context steering again when no route exists.
pub(super) fn pursue(
    actor: &mut Actor,
    pathfinder: &mut Pathfinder,
    scene: &Scene,
    navigation: &mut Navigation,
    in_sight: bool,
) {
    *actor.state = EnemyState::Aggro;
    *actor.animation = AnimationState::Walking;
    if in_sight || !route_chase(actor, pathfinder, scene, navigation) {
        context_chase(actor, scene);
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::bounding::Aabb2d;

    use super::super::{AiConfig, EnemyKind, Neighbor};
    use super::*;
    use crate::physics::Motion;

    const PLAYER: Vec2 = Vec2::new(100.0, 0.0);

    fn with_actor<R>(position: Vec2, run: impl FnOnce(&mut Actor) -> R) -> R {
        let mut motion = Motion::new(position, EnemyKind::Melee.size());
        let mut state = EnemyState::Roaming;
        let mut animation = AnimationState::Idle;
        let mut actor = Actor {
            entity: Entity::PLACEHOLDER,
            kind: EnemyKind::Melee,
            motion: &mut motion,
            state: &mut state,
            animation: &mut animation,
        };
        run(&mut actor)
    }

    fn scene<'a>(config: &'a AiConfig, obstacles: &'a [Aabb2d], enemies: &'a [Neighbor]) -> Scene<'a> {
        Scene {
            config,
            elapsed_ms: 16.0,
            player: Entity::PLACEHOLDER,
            player_position: PLAYER,
            obstacles,
            enemies,
        }
    }

    #[test]
    fn open_field_steers_straight_at_the_player() {
        let config = AiConfig::default();
        let scene = scene(&config, &[], &[]);
        let dir = with_actor(Vec2::ZERO, |actor| context_direction(actor, &scene)).unwrap();
        assert!((dir - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn nearby_wall_pushes_away() {
        let config = AiConfig::default();
        // Wall just above the enemy, spanning its path.
        let wall = Aabb2d::new(Vec2::new(0.0, 30.0), Vec2::new(100.0, 10.0));
        let scene = scene(&config, std::slice::from_ref(&wall), &[]);
        let dir = with_actor(Vec2::ZERO, |actor| context_direction(actor, &scene)).unwrap();
        assert!(dir.x > 0.0);
        assert!(dir.y < 0.0, "expected a push away from the wall, got {dir:?}");
    }

    #[test]
    fn distant_wall_is_ignored() {
        let config = AiConfig::default();
        let wall = Aabb2d::new(Vec2::new(0.0, 400.0), Vec2::new(100.0, 10.0));
        let scene = scene(&config, std::slice::from_ref(&wall), &[]);
        let dir = with_actor(Vec2::ZERO, |actor| context_direction(actor, &scene)).unwrap();
        assert!((dir - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn crowding_enemy_pushes_away() {
        let config = AiConfig::default();
        let neighbor = Neighbor {
            entity: World::new().spawn_empty().id(),
            position: Vec2::new(0.0, 40.0),
            extents: EnemyKind::Melee.size(),
        };
        let scene = scene(&config, &[], std::slice::from_ref(&neighbor));
        let dir = with_actor(Vec2::ZERO, |actor| context_direction(actor, &scene)).unwrap();
        assert!(dir.y < 0.0, "expected separation, got {dir:?}");
    }

    #[test]
    fn minion_walks_straight_at_the_player() {
        let config = AiConfig::default();
        let scene = scene(&config, &[], &[]);
        let (velocity, state) = with_actor(Vec2::ZERO, |actor| {
            actor.kind = EnemyKind::Minion;
            minion_chase(actor, &scene);
            (actor.motion.velocity, *actor.state)
        });
        assert_eq!(state, EnemyState::Aggro);
        assert!((velocity - Vec2::X * config.melee_enemy_speed).length() < 1e-3);
    }

    #[test]
    fn minion_idles_out_of_range() {
        let config = AiConfig::default();
        let scene = scene(&config, &[], &[]);
        let (velocity, state) = with_actor(Vec2::new(-1000.0, 0.0), |actor| {
            actor.kind = EnemyKind::Minion;
            actor.motion.velocity = Vec2::ONE;
            minion_chase(actor, &scene);
            (actor.motion.velocity, *actor.state)
        });
        assert_eq!(state, EnemyState::Roaming);
        assert_eq!(velocity, Vec2::ZERO);
    }
}
