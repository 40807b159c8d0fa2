//! Grid pathfinding for enemies: grid construction, A* search, and the
//! per-enemy [`Pathfinder`] that caches a route and follows it smoothly.

mod astar;
mod grid;

pub use astar::{PathError, find_path, plan_path};
pub use grid::{GridMap, GridNode, NavGridConfig};

use bevy::prelude::*;

use crate::geometry::{bezier_progress, direction, quadratic_bezier};

// === Components ===

/// Progress along the curved approach on a route's final segment.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
struct FinalApproach {
    /// Where the enemy stood when it reached the final segment.
    origin: Vec2,
    elapsed_ms: f32,
}

/// Cached route for one enemy. Owned by the AI step.
///
/// Searches are throttled: a new route is only planned when
/// `frames_until_replan` has run down to zero, or the target has drifted too
/// far from where it stood when the current route was planned.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Pathfinder {
    /// Cell-center waypoints from the enemy's cell to the target's cell.
    pub waypoints: Vec<Vec2>,
    /// Index of the waypoint currently steered toward.
    pub cursor: usize,
    /// AI frames left before another search is allowed.
    pub frames_until_replan: u32,
    /// Number of searches issued for this enemy, successful or not.
    pub searches: u32,
    planned_target: Option<Vec2>,
    approach: Option<FinalApproach>,
}

/// Steering parameters for [`Pathfinder::steer`].
#[derive(Debug, Clone, Copy)]
pub struct PathFollowing {
    pub speed: f32,
    /// A waypoint counts as reached inside this distance.
    pub reach_distance: f32,
    /// Duration of the curved approach over the final segment.
    pub blend_ms: f32,
}

impl Pathfinder {
    /// Whether a new search is due for a target now standing at `target`.
    #[must_use]
    pub fn should_replan(&self, target: Vec2, drift_threshold: f32) -> bool {
        let drifted = self
            .planned_target
            .is_some_and(|planned| planned.distance(target) > drift_threshold);
        self.frames_until_replan == 0 || drifted
    }

    /// Store a freshly planned route toward `target` and restart the throttle.
    ///
    /// The first waypoint is the enemy's own cell, so following starts from
    /// the second one when there is one.
    pub fn set_route(&mut self, waypoints: Vec<Vec2>, target: Vec2, cadence: u32) {
        self.cursor = usize::from(waypoints.len() > 1);
        self.waypoints = waypoints;
        self.record_search(target, cadence);
    }

    /// Record a search that found no route. The throttle still restarts, so a
    /// blocked enemy does not search again every frame.
    pub fn set_unreachable(&mut self, target: Vec2, cadence: u32) {
        self.waypoints.clear();
        self.cursor = 0;
        self.record_search(target, cadence);
    }

    fn record_search(&mut self, target: Vec2, cadence: u32) {
        self.planned_target = Some(target);
        self.frames_until_replan = cadence;
        self.approach = None;
        self.searches += 1;
    }

    /// Count down one AI frame toward the next permitted search.
    pub const fn tick(&mut self) {
        self.frames_until_replan = self.frames_until_replan.saturating_sub(1);
    }

    /// Drop the route and allow an immediate search.
    pub fn clear(&mut self) {
        self.waypoints.clear();
        self.cursor = 0;
        self.frames_until_replan = 0;
        self.planned_target = None;
        self.approach = None;
    }

    #[must_use]
    pub fn has_route(&self) -> bool {
        !self.waypoints.is_empty()
    }

    #[must_use]
    pub fn current_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.cursor).copied()
    }

    /// Velocity that follows the route from `position` toward `target`.
    ///
    /// Intermediate waypoints are steered at directly and skipped once
    /// reached. On the final segment the enemy tracks a quadratic Bezier from
    /// where it entered the segment, bent through the last waypoint, to the
    /// target's live position, so it curves into the target instead of
    /// snapping onto it. Returns `None` when there is no route or the
    /// steering direction is degenerate.
    pub fn steer(
        &mut self,
        position: Vec2,
        target: Vec2,
        following: PathFollowing,
        elapsed_ms: f32,
    ) -> Option<Vec2> {
        let last = self.waypoints.len().checked_sub(1)?;

        while self.cursor < last
            && position.distance(self.waypoints[self.cursor]) < following.reach_distance
        {
            self.cursor += 1;
        }

        if self.cursor < last {
            let waypoint = self.waypoints[self.cursor];
            return direction(waypoint - position).map(|dir| dir * following.speed);
        }

        let approach = self.approach.get_or_insert(FinalApproach {
            origin: position,
            elapsed_ms: 0.0,
        });
        approach.elapsed_ms += elapsed_ms;
        let t = bezier_progress(approach.elapsed_ms, following.blend_ms);
        let point = quadratic_bezier(approach.origin, self.waypoints[last], target, t);
        direction(point - position).map(|dir| dir * following.speed)
    }
}

// === Plugin ===

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Pathfinder>()
        .register_type::<NavGridConfig>()
        .init_resource::<NavGridConfig>();
}
