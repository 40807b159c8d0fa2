//! Geometry helpers shared by the physics and AI steps: bounding boxes,
//! segment/box intersection and quadratic Bezier evaluation.

use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

use crate::physics::Motion;

/// Vectors shorter than this have no usable direction.
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// Full extents of an entity's box. Negative scale only flips the sprite.
#[must_use]
pub fn bounding_box(motion: &Motion) -> Vec2 {
    motion.scale.abs()
}

/// World-space box covering an entity.
#[must_use]
pub fn motion_aabb(motion: &Motion) -> Aabb2d {
    Aabb2d::new(motion.position, bounding_box(motion) / 2.0)
}

/// Unit vector along `v`, or `None` when `v` is too short (or not finite)
/// to normalize safely.
#[must_use]
pub fn direction(v: Vec2) -> Option<Vec2> {
    let length = v.length();
    if !length.is_finite() || length < DIRECTION_EPSILON {
        return None;
    }
    Some(v / length)
}

/// Point of `aabb` nearest to `point` (the point itself when inside).
#[must_use]
pub fn closest_point(aabb: &Aabb2d, point: Vec2) -> Vec2 {
    point.clamp(aabb.min, aabb.max)
}

/// Whether the segment `start..=end` touches `aabb` (slab test, edges inclusive).
#[must_use]
pub fn segment_intersects_aabb(start: Vec2, end: Vec2, aabb: &Aabb2d) -> bool {
    let delta = end - start;
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;

    for axis in 0..2 {
        let origin = start[axis];
        let step = delta[axis];
        let (low, high) = (aabb.min[axis], aabb.max[axis]);

        if step.abs() < DIRECTION_EPSILON {
            // Parallel to this slab: must already lie inside it.
            if origin < low || origin > high {
                return false;
            }
            continue;
        }

        let inv = step.recip();
        let mut t_near = (low - origin) * inv;
        let mut t_far = (high - origin) * inv;
        if t_near > t_far {
            std::mem::swap(&mut t_near, &mut t_far);
        }
        t_min = t_min.max(t_near);
        t_max = t_max.min(t_far);
        if t_min > t_max {
            return false;
        }
    }

    true
}

/// Quadratic Bezier through `p0` and `p2` with control point `p1`.
#[must_use]
pub fn quadratic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

/// Curve parameter for `elapsed_ms` into a blend lasting `duration_ms`.
#[must_use]
pub fn bezier_progress(elapsed_ms: f32, duration_ms: f32) -> f32 {
    if duration_ms <= 0.0 {
        return 1.0;
    }
    (elapsed_ms / duration_ms).clamp(0.0, 1.0)
}
