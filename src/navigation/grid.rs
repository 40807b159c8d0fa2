//! Uniform traversability grid over the play area.

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

// === Constants ===

/// Side length of a grid cell (pixels).
const DEFAULT_CELL_SIZE: f32 = 50.0;

/// Obstacle boxes are inflated by this margin before blocking cells, so
/// planned routes keep enemies off the walls.
const DEFAULT_CLEARANCE: f32 = 30.0;

/// Smallest cell side `build` accepts; smaller or non-finite sizes are raised to it.
const MIN_CELL_SIZE: f32 = 1.0;

/// Default playable area (pixels).
const DEFAULT_AREA_SIZE: Vec2 = Vec2::new(1280.0, 720.0);

// === Resources ===

/// Layout of the pathfinding grid.
#[derive(Resource, Debug, Clone, Reflect)]
#[reflect(Resource)]
pub struct NavGridConfig {
    /// Playable area covered by the grid.
    pub area: Rect,
    pub cell_size: f32,
    /// Inflation applied to every obstacle box when marking blocked cells.
    pub clearance: f32,
}

impl Default for NavGridConfig {
    fn default() -> Self {
        Self {
            area: Rect::from_corners(Vec2::ZERO, DEFAULT_AREA_SIZE),
            cell_size: DEFAULT_CELL_SIZE,
            clearance: DEFAULT_CLEARANCE,
        }
    }
}

// === Grid ===

/// Search state of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridNode {
    pub traversable: bool,
    /// Set once the search has expanded this node.
    pub visited: bool,
    /// Cheapest known cost from the search start, in cell units.
    pub cost: f32,
    /// Node index this one was reached from.
    pub parent: Option<usize>,
}

impl GridNode {
    const OPEN: Self = Self {
        traversable: true,
        visited: false,
        cost: f32::INFINITY,
        parent: None,
    };

    fn reset(&mut self) {
        self.visited = false;
        self.cost = f32::INFINITY;
        self.parent = None;
    }
}

/// Row-major grid of [`GridNode`]s anchored at `origin` (the minimum corner).
#[derive(Debug, Clone)]
pub struct GridMap {
    origin: Vec2,
    cell_size: f32,
    columns: u32,
    rows: u32,
    nodes: Vec<GridNode>,
}

/// Neighbor offsets: the four orthogonal steps first, then diagonals.
const NEIGHBOR_OFFSETS: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, 1),
    IVec2::new(0, -1),
    IVec2::new(1, 1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(-1, -1),
];

impl GridMap {
    /// Fully traversable grid of `columns` × `rows` cells.
    #[must_use]
    pub fn new(origin: Vec2, cell_size: f32, columns: u32, rows: u32) -> Self {
        Self {
            origin,
            cell_size,
            columns,
            rows,
            nodes: vec![GridNode::OPEN; columns as usize * rows as usize],
        }
    }

    /// Grid over `config.area` with every cell blocked whose bounds overlap an
    /// obstacle box grown by `config.clearance`.
    ///
    /// A `cell_size` below [`MIN_CELL_SIZE`] (including zero, negative and NaN)
    /// is raised to it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn build(config: &NavGridConfig, obstacles: &[Aabb2d]) -> Self {
        let cell_size = config.cell_size.max(MIN_CELL_SIZE);
        let size = config.area.size();
        let columns = ((size.x / cell_size).ceil() as u32).max(1);
        let rows = ((size.y / cell_size).ceil() as u32).max(1);
        let mut grid = Self::new(config.area.min, cell_size, columns, rows);

        let margin = Vec2::splat(config.clearance);
        let inflated: Vec<Aabb2d> = obstacles
            .iter()
            .map(|obstacle| Aabb2d {
                min: obstacle.min - margin,
                max: obstacle.max + margin,
            })
            .collect();

        for index in 0..grid.nodes.len() {
            let bounds = grid.cell_bounds(grid.cell_at(index));
            if inflated.iter().any(|obstacle| overlaps(obstacle, &bounds)) {
                grid.nodes[index].traversable = false;
            }
        }

        grid
    }

    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn contains(&self, cell: UVec2) -> bool {
        cell.x < self.columns && cell.y < self.rows
    }

    /// Cell containing a world position, if it lies on the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn cell_of(&self, position: Vec2) -> Option<UVec2> {
        let local = (position - self.origin) / self.cell_size;
        if local.x < 0.0 || local.y < 0.0 || !local.is_finite() {
            return None;
        }
        let cell = UVec2::new(local.x as u32, local.y as u32);
        self.contains(cell).then_some(cell)
    }

    /// World position of a cell's center.
    #[must_use]
    pub fn cell_center(&self, cell: UVec2) -> Vec2 {
        self.origin + (cell.as_vec2() + Vec2::splat(0.5)) * self.cell_size
    }

    #[must_use]
    pub fn cell_bounds(&self, cell: UVec2) -> Aabb2d {
        Aabb2d::new(self.cell_center(cell), Vec2::splat(self.cell_size / 2.0))
    }

    #[must_use]
    pub fn node(&self, cell: UVec2) -> Option<&GridNode> {
        self.contains(cell).then(|| &self.nodes[self.index(cell)])
    }

    #[must_use]
    pub fn is_traversable(&self, cell: UVec2) -> bool {
        self.node(cell).is_some_and(|node| node.traversable)
    }

    /// Mark a cell as impassable. Cells off the grid are ignored.
    pub fn block(&mut self, cell: UVec2) {
        if self.contains(cell) {
            let index = self.index(cell);
            self.nodes[index].traversable = false;
        }
    }

    /// Clear search state (visited flags, costs, back-pointers) while keeping
    /// traversability.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }

    pub(super) const fn index(&self, cell: UVec2) -> usize {
        (cell.y * self.columns + cell.x) as usize
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(super) const fn cell_at(&self, index: usize) -> UVec2 {
        let index = index as u32;
        UVec2::new(index % self.columns, index / self.columns)
    }

    pub(super) fn node_at(&self, index: usize) -> GridNode {
        self.nodes[index]
    }

    pub(super) fn node_at_mut(&mut self, index: usize) -> &mut GridNode {
        &mut self.nodes[index]
    }

    /// Traversable neighbors of `cell` with their step costs. Diagonal steps
    /// are only offered when both orthogonal cells they pass are open, so
    /// paths never clip an obstacle corner.
    #[allow(clippy::cast_sign_loss)]
    pub(super) fn neighbors(&self, cell: UVec2) -> Vec<(UVec2, f32)> {
        let open = |offset: IVec2| -> Option<UVec2> {
            let next = cell.as_ivec2() + offset;
            if next.x < 0 || next.y < 0 {
                return None;
            }
            let next = next.as_uvec2();
            self.is_traversable(next).then_some(next)
        };

        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&offset| {
                let next = open(offset)?;
                if offset.x != 0 && offset.y != 0 {
                    open(IVec2::new(offset.x, 0))?;
                    open(IVec2::new(0, offset.y))?;
                    Some((next, std::f32::consts::SQRT_2))
                } else {
                    Some((next, 1.0))
                }
            })
            .collect()
    }
}

/// Strict overlap: boxes that merely share an edge do not block each other.
fn overlaps(a: &Aabb2d, b: &Aabb2d) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}
