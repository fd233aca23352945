//! Lane Rush - a lane-based endless driving arcade core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player, obstacles, spawning, collisions)
//! - `tuning`: Data-driven game balance
//! - `error`: Error types shared by the simulation and the tuning loader

pub mod error;
pub mod sim;
pub mod tuning;

pub use error::{AssetError, SpawnRejection, TuningError};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Number of lane slots across the road
    pub const LANE_COUNT: usize = 4;
    /// Lane centre X offsets, left shoulder to right shoulder
    pub const LANE_X: [f32; LANE_COUNT] = [-4.5, -1.5, 1.5, 4.5];

    /// Ground plane height obstacles and the player rest on
    pub const GROUND_Y: f32 = 0.0;
    /// Z of the player/camera anchor; "ahead" is negative Z
    pub const PLAYER_Z: f32 = 0.0;

    /// Lane the player starts each run in (right driving lane)
    pub const START_LANE: u8 = 2;
}

/// Linear interpolation toward `target` by at most `max_step`, snapping when within `epsilon`
#[inline]
pub fn approach(current: f32, target: f32, max_step: f32, epsilon: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_step.max(epsilon) {
        target
    } else {
        current + max_step * delta.signum()
    }
}

/// Centre of a box resting on the ground plane
#[inline]
pub fn ground_center(x: f32, z: f32, half_height: f32) -> Vec3 {
    Vec3::new(x, consts::GROUND_Y + half_height, z)
}
