//! Obstacle entities
//!
//! Obstacles are never destroyed while a session runs. They move between the
//! pool's free-lists and the active set, and `spawn` resets every piece of
//! gameplay state a previous life may have left behind.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::lanes::Lane;
use crate::ground_center;

/// Obstacle behaviour class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Roadside barrier, scrolls with the road
    Static,
    /// Traffic driving the player's way, slower than the player
    SameDirection,
    /// Traffic driving toward the player
    Oncoming,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [
        ObstacleKind::Static,
        ObstacleKind::SameDirection,
        ObstacleKind::Oncoming,
    ];

    /// Gameplay half extents. Independent of the visual variant, so a
    /// placeholder visual never changes what the player can hit.
    pub fn half_extents(self) -> Vec3 {
        match self {
            ObstacleKind::Static => Vec3::new(1.0, 0.6, 1.0),
            ObstacleKind::SameDirection | ObstacleKind::Oncoming => Vec3::new(0.9, 0.75, 2.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObstacleKind::Static => "static",
            ObstacleKind::SameDirection => "same-direction",
            ObstacleKind::Oncoming => "oncoming",
        }
    }
}

/// One value per obstacle kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerKind<T> {
    #[serde(rename = "static")]
    pub stationary: T,
    pub same_direction: T,
    pub oncoming: T,
}

impl<T> PerKind<T> {
    pub fn new(stationary: T, same_direction: T, oncoming: T) -> Self {
        Self {
            stationary,
            same_direction,
            oncoming,
        }
    }

    pub fn get(&self, kind: ObstacleKind) -> &T {
        match kind {
            ObstacleKind::Static => &self.stationary,
            ObstacleKind::SameDirection => &self.same_direction,
            ObstacleKind::Oncoming => &self.oncoming,
        }
    }

    pub fn get_mut(&mut self, kind: ObstacleKind) -> &mut T {
        match kind {
            ObstacleKind::Static => &mut self.stationary,
            ObstacleKind::SameDirection => &mut self.same_direction,
            ObstacleKind::Oncoming => &mut self.oncoming,
        }
    }
}

/// Opaque pool handle for an obstacle instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub(crate) u32);

impl ObstacleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Renderer-side handle returned by the asset collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// What the scene should draw for an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visual {
    /// A loaded model variant
    Model { variant: u8, handle: VisualHandle },
    /// Plain box used when the model could not be loaded
    Placeholder { size: Vec3 },
}

impl Visual {
    /// Deterministic stand-in shape for a kind
    pub fn placeholder(kind: ObstacleKind) -> Self {
        Visual::Placeholder {
            size: kind.half_extents() * 2.0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Visual::Placeholder { .. })
    }
}

/// A pooled obstacle instance
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    pub active: bool,
    pub lane: Lane,
    /// Centre of the obstacle (lane X, resting height, scroll Z)
    pub position: Vec3,
    pub bounds: Aabb,
    /// Seconds since the current spawn
    pub age: f32,
    /// Chosen once at construction and kept across reuse
    pub visual: Visual,
}

impl Obstacle {
    pub(crate) fn new(id: ObstacleId, kind: ObstacleKind, visual: Visual) -> Self {
        Self {
            id,
            kind,
            active: false,
            lane: Lane::LEFT_SHOULDER,
            position: Vec3::ZERO,
            bounds: Aabb::from_center(Vec3::ZERO, kind.half_extents()),
            age: 0.0,
            visual,
        }
    }

    /// Activate at the given lane and scroll Z. Clears everything left over
    /// from a previous life.
    pub fn spawn(&mut self, lane: Lane, z: f32) {
        let half = self.kind.half_extents();
        self.lane = lane;
        self.position = ground_center(lane.x(), z, half.y);
        self.age = 0.0;
        self.active = true;
        self.refresh_bounds();
    }

    /// Recompute the bounding box from the current position
    pub fn refresh_bounds(&mut self) {
        self.bounds = Aabb::from_center(self.position, self.kind.half_extents());
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.position.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_resets_transient_state() {
        let mut obstacle = Obstacle::new(
            ObstacleId(0),
            ObstacleKind::Oncoming,
            Visual::placeholder(ObstacleKind::Oncoming),
        );
        obstacle.spawn(Lane::ONCOMING, -100.0);
        obstacle.position.z = 5.0;
        obstacle.age = 3.0;
        obstacle.active = false;

        obstacle.spawn(Lane::ONCOMING, -80.0);
        assert!(obstacle.active);
        assert_eq!(obstacle.age, 0.0);
        assert_eq!(obstacle.position.x, Lane::ONCOMING.x());
        assert_eq!(obstacle.position.z, -80.0);
        assert_eq!(obstacle.bounds.center(), obstacle.position);
    }

    #[test]
    fn test_per_kind_lookup() {
        let mut table = PerKind::new(1, 2, 3);
        assert_eq!(*table.get(ObstacleKind::SameDirection), 2);
        *table.get_mut(ObstacleKind::Oncoming) += 10;
        assert_eq!(table.oncoming, 13);
    }

    #[test]
    fn test_placeholder_matches_gameplay_size() {
        for kind in ObstacleKind::ALL {
            match Visual::placeholder(kind) {
                Visual::Placeholder { size } => assert_eq!(size, kind.half_extents() * 2.0),
                Visual::Model { .. } => panic!("placeholder expected"),
            }
        }
    }
}
