//! Collision detection
//!
//! Discrete, per-frame axis-aligned box overlap between the player and each
//! active obstacle. There is no swept test: at low frame rates fast oncoming
//! traffic can pass through the player between two frames.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleId, ObstacleKind};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Box centred on `center` extending `half` along each axis
    pub fn from_center(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Strict overlap on all three axes (touching faces do not count)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// The obstacle that ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionHit {
    pub obstacle: ObstacleId,
    pub kind: ObstacleKind,
}

/// Test the player against every active obstacle, stopping at the first hit
pub fn first_collision<'a>(
    player: &Aabb,
    obstacles: impl IntoIterator<Item = &'a Obstacle>,
) -> Option<CollisionHit> {
    obstacles
        .into_iter()
        .filter(|o| o.active)
        .find(|o| player.intersects(&o.bounds))
        .map(|o| CollisionHit {
            obstacle: o.id,
            kind: o.kind,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::lanes::Lane;
    use crate::sim::obstacle::Visual;

    fn obstacle(id: u32, kind: ObstacleKind, lane: Lane, z: f32) -> Obstacle {
        let mut o = Obstacle::new(ObstacleId(id), kind, Visual::placeholder(kind));
        o.spawn(lane, z);
        o
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = Aabb::from_center(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        // Touching faces are not a hit
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_aabb_new_orders_corners() {
        let a = Aabb::new(Vec3::splat(2.0), Vec3::splat(-2.0));
        assert_eq!(a.min, Vec3::splat(-2.0));
        assert_eq!(a.half_extents(), Vec3::splat(2.0));
    }

    #[test]
    fn test_first_collision_reports_kind() {
        let player = Aabb::from_center(
            Vec3::new(Lane::ONCOMING.x(), 0.6, 0.0),
            Vec3::new(0.8, 0.6, 1.8),
        );
        let obstacles = vec![
            obstacle(0, ObstacleKind::Static, Lane::LEFT_SHOULDER, 0.0),
            obstacle(1, ObstacleKind::Oncoming, Lane::ONCOMING, 1.0),
            obstacle(2, ObstacleKind::Oncoming, Lane::ONCOMING, -1.0),
        ];
        let hit = first_collision(&player, &obstacles).expect("should hit");
        assert_eq!(hit.kind, ObstacleKind::Oncoming);
        assert_eq!(hit.obstacle, ObstacleId(1));
    }

    #[test]
    fn test_inactive_obstacles_are_ignored() {
        let player = Aabb::from_center(
            Vec3::new(Lane::SAME_DIRECTION.x(), 0.6, 0.0),
            Vec3::new(0.8, 0.6, 1.8),
        );
        let mut o = obstacle(0, ObstacleKind::SameDirection, Lane::SAME_DIRECTION, 0.0);
        o.active = false;
        assert!(first_collision(&player, [&o]).is_none());
    }

    #[test]
    fn test_neighbouring_lane_does_not_collide() {
        let player = Aabb::from_center(
            Vec3::new(Lane::SAME_DIRECTION.x(), 0.6, 0.0),
            Vec3::new(0.8, 0.6, 1.8),
        );
        let o = obstacle(0, ObstacleKind::Oncoming, Lane::ONCOMING, 0.0);
        assert!(first_collision(&player, [&o]).is_none());
    }
}
