//! Player kinematic state machine
//!
//! Owns lane position, gear and braking. Consumes discrete intents and
//! exposes the speed multiplier the rest of the frame is driven by.

use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::lanes::Lane;
use crate::consts::{PLAYER_Z, START_LANE};
use crate::tuning::PlayerTuning;
use crate::{approach, ground_center};

/// Discrete input intents delivered by the input collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    GearUp,
    GearDown,
    BrakeStart,
    BrakeEnd,
}

/// The player's car
#[derive(Debug, Clone)]
pub struct Player {
    /// Lane last arrived at
    pub current_lane: Lane,
    /// Lane being steered toward; may move again mid-transition
    pub target_lane: Lane,
    pub gear: u32,
    pub is_changing_lanes: bool,
    pub is_braking: bool,
    /// Lateral position
    pub x: f32,
    pub bounds: Aabb,
    /// Seconds until another gear-up is accepted
    gear_cooldown: f32,
    /// Seconds accumulated toward the next braking downshift
    brake_timer: f32,
    tuning: PlayerTuning,
}

impl Player {
    pub fn new(tuning: PlayerTuning) -> Self {
        let start = Lane::new(START_LANE).unwrap_or(Lane::SAME_DIRECTION);
        let mut player = Self {
            current_lane: start,
            target_lane: start,
            gear: 1,
            is_changing_lanes: false,
            is_braking: false,
            x: start.x(),
            bounds: Aabb::default(),
            gear_cooldown: 0.0,
            brake_timer: 0.0,
            tuning,
        };
        player.refresh_bounds();
        player
    }

    /// Back to the start lane in first gear with no transient state
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning.clone());
    }

    /// Apply one intent. Returns true if the gear changed.
    pub fn apply(&mut self, intent: Intent) -> bool {
        match intent {
            Intent::MoveLeft => {
                self.target_lane = self.target_lane.left();
                self.sync_lane_flag();
                false
            }
            Intent::MoveRight => {
                self.target_lane = self.target_lane.right();
                self.sync_lane_flag();
                false
            }
            Intent::GearUp => {
                // Holding the brake wins over a gear-up
                if self.is_braking
                    || self.gear_cooldown > 0.0
                    || self.gear >= self.tuning.max_gear
                {
                    return false;
                }
                self.gear += 1;
                self.gear_cooldown = self.tuning.gear_up_cooldown;
                true
            }
            Intent::GearDown => {
                if self.gear > 1 {
                    self.gear -= 1;
                    true
                } else {
                    false
                }
            }
            Intent::BrakeStart => {
                // A repeated BrakeStart while held keeps the running timer
                if !self.is_braking {
                    self.brake_timer = 0.0;
                }
                // Nothing to shed in first gear
                self.is_braking = self.gear > 1;
                false
            }
            Intent::BrakeEnd => {
                self.is_braking = false;
                self.brake_timer = 0.0;
                false
            }
        }
    }

    /// Advance timers, braking and the lane transition, then rebuild the
    /// bounding box. Returns true if braking shed a gear.
    pub fn update(&mut self, dt: f32) -> bool {
        self.gear_cooldown = (self.gear_cooldown - dt).max(0.0);

        let mut shifted = false;
        if self.is_braking {
            self.brake_timer += dt;
            while self.brake_timer >= self.tuning.brake_interval && self.gear > 1 {
                self.brake_timer -= self.tuning.brake_interval;
                self.gear -= 1;
                shifted = true;
            }
            if self.gear <= 1 {
                self.is_braking = false;
                self.brake_timer = 0.0;
            }
        }

        let target_x = self.target_lane.x();
        self.x = approach(
            self.x,
            target_x,
            self.tuning.lane_change_speed * dt,
            self.tuning.snap_epsilon,
        );
        if self.x == target_x {
            self.current_lane = self.target_lane;
        }
        self.sync_lane_flag();
        self.refresh_bounds();

        shifted
    }

    fn sync_lane_flag(&mut self) {
        self.is_changing_lanes = (self.x - self.target_lane.x()).abs() > self.tuning.snap_epsilon;
    }

    pub fn refresh_bounds(&mut self) {
        let half = self.tuning.half_extents;
        self.bounds = Aabb::from_center(ground_center(self.x, PLAYER_Z, half.y), half);
    }

    /// Effective speed multiplier from gear and lane-change bonus
    pub fn speed_multiplier(&self) -> f32 {
        let base = 1.0 + (self.gear.saturating_sub(1)) as f32 * self.tuning.gear_increment;
        if self.is_changing_lanes {
            base * self.tuning.lane_change_boost
        } else {
            base
        }
    }

    pub fn tuning(&self) -> &PlayerTuning {
        &self.tuning
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new(PlayerTuning::default())
    }
}
