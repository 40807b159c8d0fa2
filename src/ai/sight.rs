use bevy::math::bounding::Aabb2d;
use bevy::prelude::*;

use crate::geometry::{direction, segment_intersects_aabb};

/// Whether the straight line from `from` to `to` clears every obstacle box.
///
/// The line is marched in steps of `increment`; each sub-segment is tested
/// against every box, so thin walls between samples are still caught. A
/// non-positive increment tests the whole line in one go.
#[must_use]
pub fn line_of_sight(from: Vec2, to: Vec2, obstacles: &[Aabb2d], increment: f32) -> bool {
    let offset = to - from;
    let Some(heading) = direction(offset) else {
        return true;
    };
    let distance = offset.length();
    let increment = if increment > 0.0 { increment } else { distance };

    let mut travelled = 0.0;
    let mut sample = from;
    while travelled < distance {
        let next_travelled = (travelled + increment).min(distance);
        let next = from + heading * next_travelled;
        if obstacles
            .iter()
            .any(|obstacle| segment_intersects_aabb(sample, next, obstacle))
        {
            return false;
        }
        sample = next;
        travelled = next_travelled;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at(center: Vec2) -> Aabb2d {
        Aabb2d::new(center, Vec2::new(5.0, 100.0))
    }

    #[test]
    fn open_field_is_visible() {
        assert!(line_of_sight(Vec2::ZERO, Vec2::new(300.0, 40.0), &[], 50.0));
    }

    #[test]
    fn wall_between_blocks_sight() {
        let wall = wall_at(Vec2::new(150.0, 0.0));
        assert!(!line_of_sight(Vec2::ZERO, Vec2::new(300.0, 0.0), &[wall], 50.0));
    }

    #[test]
    fn removing_the_wall_restores_sight() {
        let (from, to) = (Vec2::new(-20.0, 35.0), Vec2::new(260.0, -15.0));
        let wall = wall_at(Vec2::new(120.0, 0.0));
        assert!(!line_of_sight(from, to, &[wall], 50.0));
        assert!(line_of_sight(from, to, &[], 50.0));
    }

    #[test]
    fn thin_wall_between_samples_still_blocks() {
        // Samples land at 50 and 100; the wall sits strictly between them.
        let wall = wall_at(Vec2::new(75.0, 0.0));
        assert!(!line_of_sight(Vec2::ZERO, Vec2::new(300.0, 0.0), &[wall], 50.0));
    }

    #[test]
    fn walls_off_the_line_do_not_block() {
        let beside = wall_at(Vec2::new(150.0, 300.0));
        let behind = wall_at(Vec2::new(400.0, 0.0));
        assert!(line_of_sight(
            Vec2::ZERO,
            Vec2::new(300.0, 0.0),
            &[beside, behind],
            50.0
        ));
    }

    #[test]
    fn coincident_points_are_visible() {
        let wall = wall_at(Vec2::ZERO);
        assert!(line_of_sight(Vec2::ZERO, Vec2::ZERO, &[wall], 50.0));
    }

    #[test]
    fn zero_increment_checks_the_whole_line() {
        let wall = wall_at(Vec2::new(150.0, 0.0));
        assert!(!line_of_sight(Vec2::ZERO, Vec2::new(300.0, 0.0), &[wall], 0.0));
    }
}
