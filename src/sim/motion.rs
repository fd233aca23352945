//! Obstacle motion and recycling
//!
//! The world is player-relative: the player stays at `PLAYER_Z` and obstacles
//! travel toward +Z at a speed chosen by kind. All speed rules live in
//! `speed_for` so they can be audited in one place.

use super::difficulty::DifficultyTier;
use super::obstacle::{ObstacleId, ObstacleKind};
use super::pool::ObstaclePool;
use crate::tuning::MotionTuning;

/// Frame-wide inputs to the speed rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionContext {
    /// Road scroll speed for the player's current gear
    pub scroll_speed: f32,
    /// Current tier's same-direction factor
    pub same_direction_factor: f32,
    /// Oncoming traffic's own speed
    pub oncoming_closing_speed: f32,
}

impl MotionContext {
    pub fn new(motion: &MotionTuning, speed_multiplier: f32, tier: &DifficultyTier) -> Self {
        Self {
            scroll_speed: motion.base_scroll_speed * speed_multiplier,
            same_direction_factor: tier.speed_factor,
            oncoming_closing_speed: motion.oncoming_closing_speed,
        }
    }
}

/// Approach speed toward the player (+Z, world units/s)
pub fn speed_for(kind: ObstacleKind, ctx: &MotionContext) -> f32 {
    match kind {
        ObstacleKind::Static => ctx.scroll_speed,
        ObstacleKind::SameDirection => ctx.scroll_speed * (1.0 + ctx.same_direction_factor),
        ObstacleKind::Oncoming => ctx.oncoming_closing_speed + ctx.scroll_speed,
    }
}

/// Move every active obstacle and rebuild its bounding box
pub fn advance(pool: &mut ObstaclePool, ctx: &MotionContext, dt: f32) {
    for obstacle in pool.active_mut() {
        obstacle.position.z += speed_for(obstacle.kind, ctx) * dt;
        obstacle.age += dt;
        obstacle.refresh_bounds();
    }
}

/// True once an obstacle has left the world window around the player
pub fn is_expired(z: f32, player_z: f32, motion: &MotionTuning) -> bool {
    z > player_z + motion.despawn_behind || z < player_z - motion.max_lookahead
}

/// Retire expired obstacles to the pool. Returns how many were retired.
pub fn recycle(pool: &mut ObstaclePool, player_z: f32, motion: &MotionTuning) -> Vec<ObstacleId> {
    let expired: Vec<ObstacleId> = pool
        .iter_active()
        .filter(|o| is_expired(o.z(), player_z, motion))
        .map(|o| o.id)
        .collect();
    for &id in &expired {
        pool.release(id);
    }
    expired
}
