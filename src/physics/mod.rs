//! Discrete-time physics: position integration and the all-pairs AABB sweep
//! that feeds the collision event queue.
//!
//! The sweep is O(n²) in the number of `Motion` entities. That is fine for the
//! handful of actors in an arena and is the first thing to replace (with a
//! spatial hash or sweep-and-prune) if entity counts grow.

use bevy::ecs::lifecycle::HookContext;
use bevy::ecs::world::DeferredWorld;
use bevy::prelude::*;

use crate::SimulationSet;

// === Components ===

/// Kinematic state shared by every simulated entity.
///
/// `scale` is the full visual/collision extent. Its sign only encodes facing;
/// collision uses the absolute value.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
#[require(SpawnOrder)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
    pub scale: Vec2,
    /// Rotation in radians.
    pub angle: f32,
}

impl Motion {
    /// Motion at rest at `position` with extents `scale`.
    #[must_use]
    pub const fn new(position: Vec2, scale: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            scale,
            angle: 0.0,
        }
    }

    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }
}

/// Position of an entity in the global spawn sequence. Both simulation
/// steps visit entities in ascending `SpawnOrder`.
///
/// Stamped from [`SpawnSequence`] when the component is added. `Entity`
/// ordering does not follow spawn order.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Reflect)]
#[component(on_add = stamp_spawn_order)]
#[reflect(Component)]
pub struct SpawnOrder(pub u64);

/// Counter handing out [`SpawnOrder`] values.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct SpawnSequence {
    next: u64,
}

impl SpawnSequence {
    /// Take the next sequence number.
    pub fn advance(&mut self) -> u64 {
        let current = self.next;
        self.next += 1;
        current
    }
}

fn stamp_spawn_order(mut world: DeferredWorld, HookContext { entity, .. }: HookContext) {
    let Some(order) = world
        .get_resource_mut::<SpawnSequence>()
        .map(|mut sequence| sequence.advance())
    else {
        warn!("Entity {entity} spawned before SpawnSequence was initialized");
        return;
    };
    if let Some(mut stamp) = world.get_mut::<SpawnOrder>(entity) {
        stamp.0 = order;
    }
}

// === Collision Queue ===

/// One side of a detected overlap: `entity` collided with `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct CollisionEvent {
    pub entity: Entity,
    pub other: Entity,
}

/// Collisions appended by the physics step, consumed and cleared by gameplay
/// systems downstream.
///
/// Every overlapping pair is recorded in both orders so each side can resolve
/// independently. Entries are never deduplicated; consumers must tolerate
/// repeats.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct CollisionEvents {
    events: Vec<CollisionEvent>,
}

impl CollisionEvents {
    pub fn push(&mut self, entity: Entity, other: Entity) {
        self.events.push(CollisionEvent { entity, other });
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionEvent> {
        self.events.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every queued event, leaving the queue empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, CollisionEvent> {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

// === Pure Functions ===

/// Advance `motion` by its velocity over `elapsed_ms` milliseconds.
pub fn integrate(motion: &mut Motion, elapsed_ms: f32) {
    let step_seconds = elapsed_ms / 1000.0;
    motion.position += motion.velocity * step_seconds;
}

/// Box overlap test between two entities.
///
/// The inequality set mixes the two boxes' vertical edges in a fixed order
/// (`top_b < bottom_a`, then `top_a < bottom_b`). Keep it exactly as written:
/// gameplay tuning was done against this predicate, and edge-touching boxes
/// must not collide.
#[must_use]
pub fn collides(a: &Motion, b: &Motion) -> bool {
    let half_a = a.scale.abs() / 2.0;
    let half_b = b.scale.abs() / 2.0;

    let a_left = a.position.x - half_a.x;
    let a_right = a.position.x + half_a.x;
    let a_top = a.position.y - half_a.y;
    let a_bottom = a.position.y + half_a.y;

    let b_left = b.position.x - half_b.x;
    let b_right = b.position.x + half_b.x;
    let b_top = b.position.y - half_b.y;
    let b_bottom = b.position.y + half_b.y;

    a_right > b_left && b_top < a_bottom && a_left < b_right && a_top < b_bottom
}

/// Test every unordered pair of `bodies` once, in slice order, appending both
/// orderings of each overlapping pair to `events`.
pub fn detect_collisions(bodies: &[(Entity, Motion)], events: &mut CollisionEvents) {
    for (i, (entity_i, motion_i)) in bodies.iter().enumerate() {
        for (entity_j, motion_j) in &bodies[i + 1..] {
            if collides(motion_i, motion_j) {
                events.push(*entity_i, *entity_j);
                events.push(*entity_j, *entity_i);
            }
        }
    }
}

// === Systems ===

/// Integrates every `Motion`, then sweeps all pairs for overlaps.
///
/// Bodies are swept in spawn order so the event queue comes out in the same
/// order every run. Runs in `SimulationSet::Physics`, after the AI step has
/// written this frame's velocities.
pub fn physics_step(
    time: Res<Time>,
    mut bodies: Query<(Entity, &SpawnOrder, &mut Motion)>,
    mut collisions: ResMut<CollisionEvents>,
) {
    let elapsed_ms = time.delta_secs() * 1000.0;

    let mut ordered = Vec::new();
    for (entity, order, mut motion) in &mut bodies {
        integrate(&mut motion, elapsed_ms);
        ordered.push((*order, entity, *motion));
    }
    ordered.sort_by_key(|(order, ..)| *order);
    let snapshot: Vec<(Entity, Motion)> = ordered
        .into_iter()
        .map(|(_, entity, motion)| (entity, motion))
        .collect();

    let queued_before = collisions.len();
    detect_collisions(&snapshot, &mut collisions);
    let emitted = collisions.len() - queued_before;
    if emitted > 0 {
        trace!(
            "physics step: {emitted} collision records from {} bodies",
            snapshot.len()
        );
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Motion>()
        .register_type::<SpawnOrder>()
        .register_type::<SpawnSequence>()
        .register_type::<CollisionEvents>()
        .init_resource::<SpawnSequence>()
        .init_resource::<CollisionEvents>();

    app.add_systems(Update, physics_step.in_set(SimulationSet::Physics));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body(x: f32, y: f32, w: f32, h: f32) -> Motion {
        Motion::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    /// `count` distinct entities in ascending order.
    fn entities(count: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..count).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn integrate_moves_by_velocity_times_seconds() {
        let mut motion = body(10.0, 20.0, 1.0, 1.0).with_velocity(Vec2::new(100.0, -50.0));
        integrate(&mut motion, 500.0);
        assert_eq!(motion.position, Vec2::new(60.0, -5.0));
    }

    #[test]
    fn integrate_is_deterministic_for_identical_input() {
        let start = body(3.3, -7.1, 1.0, 1.0).with_velocity(Vec2::new(123.456, 78.9));
        let mut first = start;
        let mut second = start;
        integrate(&mut first, 16.6667);
        integrate(&mut second, 16.6667);
        assert_eq!(first.position.x.to_bits(), second.position.x.to_bits());
        assert_eq!(first.position.y.to_bits(), second.position.y.to_bits());
    }

    #[test]
    fn integrate_leaves_scale_and_angle_untouched() {
        let mut motion = body(0.0, 0.0, -20.0, 10.0).with_velocity(Vec2::X);
        motion.angle = 1.25;
        integrate(&mut motion, 1000.0);
        assert_eq!(motion.scale, Vec2::new(-20.0, 10.0));
        assert_eq!(motion.angle, 1.25);
    }

    #[test]
    fn boxes_touching_at_an_edge_do_not_collide() {
        let a = body(0.0, 0.0, 10.0, 10.0);
        let b = body(10.0, 0.0, 10.0, 10.0);
        assert!(!collides(&a, &b));
        assert!(!collides(&b, &a));
    }

    #[test]
    fn boxes_overlapping_by_one_unit_collide() {
        let a = body(0.0, 0.0, 10.0, 10.0);
        let b = body(9.0, 0.0, 10.0, 10.0);
        assert!(collides(&a, &b));
        assert!(collides(&b, &a));
    }

    #[test]
    fn vertical_edge_contact_does_not_collide() {
        let a = body(0.0, 0.0, 10.0, 10.0);
        let b = body(0.0, 10.0, 10.0, 10.0);
        assert!(!collides(&a, &b));
        assert!(collides(&a, &body(0.0, 9.5, 10.0, 10.0)));
    }

    #[test]
    fn negative_scale_uses_absolute_extent() {
        let a = body(0.0, 0.0, -10.0, 10.0);
        let b = body(9.0, 0.0, 10.0, -10.0);
        assert!(collides(&a, &b));
    }

    #[test]
    fn overlapping_pair_emits_both_orderings_once() {
        let [a, b, far] = entities(3)[..] else {
            unreachable!()
        };
        let bodies = [
            (a, body(0.0, 0.0, 10.0, 10.0)),
            (b, body(5.0, 5.0, 10.0, 10.0)),
            (far, body(500.0, 500.0, 10.0, 10.0)),
        ];

        let mut events = CollisionEvents::default();
        detect_collisions(&bodies, &mut events);

        let recorded: Vec<_> = events.iter().copied().collect();
        assert_eq!(
            recorded,
            vec![
                CollisionEvent { entity: a, other: b },
                CollisionEvent { entity: b, other: a },
            ]
        );
    }

    #[test]
    fn repeated_sweeps_append_duplicates() {
        let [a, b] = entities(2)[..] else {
            unreachable!()
        };
        let bodies = [(a, body(0.0, 0.0, 10.0, 10.0)), (b, body(1.0, 0.0, 10.0, 10.0))];

        let mut events = CollisionEvents::default();
        detect_collisions(&bodies, &mut events);
        detect_collisions(&bodies, &mut events);

        assert_eq!(events.len(), 4);
        assert_eq!(events.drain().count(), 4);
        assert!(events.is_empty());
    }

    #[test]
    fn three_way_overlap_records_every_pair() {
        let ids = entities(3);
        let bodies: Vec<_> = ids.iter().map(|id| (*id, body(0.0, 0.0, 10.0, 10.0))).collect();

        let mut events = CollisionEvents::default();
        detect_collisions(&bodies, &mut events);

        assert_eq!(events.len(), 6);
        for event in events.iter() {
            assert_ne!(event.entity, event.other);
        }
    }
}
