//! Common imports for simulation code and its callers.

pub use bevy::prelude::*;

pub use crate::SimulationSet;
pub use crate::ai::{
    AiConfig, AiRng, AnimationState, EnemyKind, EnemyState, MeleeHits, Obstacle, Player,
    Projectile,
};
pub use crate::physics::{CollisionEvents, Motion, SpawnOrder};
pub use crate::spawn::{spawn_enemy, spawn_obstacle, spawn_player, spawn_projectile};
