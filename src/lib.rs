//! Enemy AI and physics simulation core for a 2D action game.
//!
//! Each frame the AI step decides where every enemy wants to go and what it
//! does there, then the physics step moves everything and records overlaps.

pub mod ai;
pub mod geometry;
pub mod navigation;
pub mod physics;
pub mod prelude;
pub mod spawn;
#[cfg(test)]
pub mod testing;

use bevy::prelude::*;

/// Ordering of the simulation steps within `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Enemy decisions: writes velocity, facing and animation state.
    Ai,
    /// Integration and collision detection.
    Physics,
}

/// Installs the simulation: resources, reflected types and both steps.
pub fn plugin(app: &mut App) {
    app.configure_sets(Update, (SimulationSet::Ai, SimulationSet::Physics).chain());
    app.add_plugins((physics::plugin, navigation::plugin, ai::plugin));
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::ai::{AiConfig, AiRng, EnemyKind, EnemyState};
    use crate::physics::{CollisionEvents, Motion};
    use crate::spawn::{spawn_enemy, spawn_player};
    use crate::testing::{create_test_app, spawn_with, tick_multiple};

    fn create_simulation_app() -> App {
        let mut app = create_test_app();
        app.insert_resource(AiRng::seeded(1));
        app.add_plugins(plugin);
        app
    }

    #[test]
    fn plugin_installs_resources() {
        let app = create_simulation_app();
        let world = app.world();
        assert!(world.contains_resource::<AiConfig>());
        assert!(world.contains_resource::<CollisionEvents>());
        assert!(world.contains_resource::<crate::navigation::NavGridConfig>());
        assert!(world.contains_resource::<crate::ai::MeleeHits>());
    }

    #[test]
    fn physics_moves_what_ai_steers() {
        let mut app = create_simulation_app();
        let (minion, start) = spawn_with(&mut app, |commands| {
            spawn_player(commands, Vec2::new(600.0, 300.0));
            let start = Vec2::new(400.0, 300.0);
            let config = AiConfig::default();
            (spawn_enemy(commands, EnemyKind::Minion, start, &config), start)
        });

        tick_multiple(&mut app, 10);

        let world = app.world();
        assert_eq!(world.get::<EnemyState>(minion), Some(&EnemyState::Aggro));
        let position = world.get::<Motion>(minion).unwrap().position;
        assert!(position.x > start.x, "minion should close in, at {position}");
    }

    #[test]
    fn contact_with_the_player_is_reported() {
        let mut app = create_simulation_app();
        let (player, minion) = spawn_with(&mut app, |commands| {
            let player = spawn_player(commands, Vec2::new(450.0, 300.0));
            let config = AiConfig::default();
            let minion = spawn_enemy(commands, EnemyKind::Minion, Vec2::new(400.0, 300.0), &config);
            (player, minion)
        });

        tick_multiple(&mut app, 1);

        let events = app.world().resource::<CollisionEvents>();
        assert!(
            events
                .iter()
                .any(|event| event.entity == minion && event.other == player)
        );
        assert!(
            events
                .iter()
                .any(|event| event.entity == player && event.other == minion)
        );
    }
}
