//! A* search over a [`GridMap`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy::prelude::*;
use thiserror::Error;

use super::grid::GridMap;

/// Why a route could not be planned. Always recoverable: callers fall back to
/// steering straight at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("start position is outside the grid")]
    StartOutOfBounds,
    #[error("goal position is outside the grid")]
    GoalOutOfBounds,
    #[error("start cell {0} is blocked")]
    StartBlocked(UVec2),
    #[error("goal cell {0} is blocked")]
    GoalBlocked(UVec2),
    #[error("no route from {start} to {goal}")]
    Unreachable { start: UVec2, goal: UVec2 },
}

/// Frontier entry ordered so the lowest estimate pops first from the max-heap.
/// Ties break toward the lower node index to keep searches reproducible.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    estimate: f32,
    index: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

/// Straight-line distance in cell units. Admissible for 8-connected moves
/// costing 1 and √2.
fn heuristic(from: UVec2, to: UVec2) -> f32 {
    from.as_vec2().distance(to.as_vec2())
}

/// Find the cheapest 8-connected route from `start` to `goal`, both inclusive.
///
/// Resets the grid's search state first, so one grid can serve many searches.
pub fn find_path(grid: &mut GridMap, start: UVec2, goal: UVec2) -> Result<Vec<UVec2>, PathError> {
    if !grid.contains(start) {
        return Err(PathError::StartOutOfBounds);
    }
    if !grid.contains(goal) {
        return Err(PathError::GoalOutOfBounds);
    }
    if !grid.is_traversable(start) {
        return Err(PathError::StartBlocked(start));
    }
    if !grid.is_traversable(goal) {
        return Err(PathError::GoalBlocked(goal));
    }

    grid.reset();
    let start_index = grid.index(start);
    let goal_index = grid.index(goal);
    grid.node_at_mut(start_index).cost = 0.0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        estimate: heuristic(start, goal),
        index: start_index,
    });

    while let Some(OpenEntry { index, .. }) = open.pop() {
        let node = grid.node_at(index);
        if node.visited {
            continue;
        }
        grid.node_at_mut(index).visited = true;

        if index == goal_index {
            return Ok(reconstruct(grid, goal_index));
        }

        let cell = grid.cell_at(index);
        for (next, step_cost) in grid.neighbors(cell) {
            let next_index = grid.index(next);
            let neighbor = grid.node_at_mut(next_index);
            if neighbor.visited {
                continue;
            }
            let cost = node.cost + step_cost;
            if cost < neighbor.cost {
                neighbor.cost = cost;
                neighbor.parent = Some(index);
                open.push(OpenEntry {
                    estimate: cost + heuristic(next, goal),
                    index: next_index,
                });
            }
        }
    }

    Err(PathError::Unreachable { start, goal })
}

/// Walk back-pointers from the goal, then reverse into start-to-goal order.
fn reconstruct(grid: &GridMap, goal_index: usize) -> Vec<UVec2> {
    let mut path = vec![grid.cell_at(goal_index)];
    let mut current = grid.node_at(goal_index).parent;
    while let Some(index) = current {
        path.push(grid.cell_at(index));
        current = grid.node_at(index).parent;
    }
    path.reverse();
    path
}

/// World-space route between two positions as cell-center waypoints.
pub fn plan_path(grid: &mut GridMap, from: Vec2, to: Vec2) -> Result<Vec<Vec2>, PathError> {
    let start = grid.cell_of(from).ok_or(PathError::StartOutOfBounds)?;
    let goal = grid.cell_of(to).ok_or(PathError::GoalOutOfBounds)?;
    let cells = find_path(grid, start, goal)?;
    Ok(cells.into_iter().map(|cell| grid.cell_center(cell)).collect())
}
