//! Testing utilities for simulation systems.

#![cfg(test)]

use std::time::Duration;

use bevy::ecs::query::QueryFilter;
use bevy::ecs::world::CommandQueue;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

use crate::physics::SpawnSequence;

/// Fixed frame length used by every test app.
pub const FRAME: Duration = Duration::from_millis(16);

/// [`FRAME`] in milliseconds, as the simulation steps see it.
pub const FRAME_MS: f32 = 16.0;

/// Creates a minimal app whose clock advances by exactly [`FRAME`] per update
/// and whose spawns are stamped with a [`SpawnSequence`].
///
/// The first update, which only starts the clock (zero delta), has already
/// run when this returns.
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME))
        .init_resource::<SpawnSequence>();
    app.update();
    app
}

/// Helper to advance the app by one frame.
pub fn tick(app: &mut App) {
    app.update();
}

/// Helper to advance the app by multiple frames.
pub fn tick_multiple(app: &mut App, count: usize) {
    for _ in 0..count {
        app.update();
    }
}

/// Run `spawn` against the app's world through `Commands` and apply the
/// queued commands immediately.
pub fn spawn_with<R>(app: &mut App, spawn: impl FnOnce(&mut Commands) -> R) -> R {
    let mut queue = CommandQueue::default();
    let world = app.world_mut();
    let result = {
        let mut commands = Commands::new(&mut queue, world);
        spawn(&mut commands)
    };
    queue.apply(world);
    result
}

/// Assert the number of entities matching `F`.
pub fn assert_entity_count<F: QueryFilter>(app: &mut App, expected: usize) {
    let actual = app
        .world_mut()
        .query_filtered::<Entity, F>()
        .iter(app.world())
        .count();
    assert_eq!(actual, expected, "entity count for {}", std::any::type_name::<F>());
}
