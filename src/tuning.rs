//! Data-driven game balance
//!
//! Every knob the simulation reads lives here so runs can be re-balanced (or
//! made deterministic for tests) without touching code. Loaded from JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::difficulty::{DifficultyTier, default_tiers};
use crate::sim::lanes::Lane;
use crate::sim::obstacle::PerKind;
use crate::sim::spawn::SpawnMode;

/// Player kinematics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Lateral speed while changing lanes (world units/s)
    pub lane_change_speed: f32,
    /// Distance under which the player snaps onto the lane centre
    pub snap_epsilon: f32,
    /// Speed multiplier added per gear above 1
    pub gear_increment: f32,
    pub max_gear: u32,
    /// Minimum seconds between two accepted gear-ups
    pub gear_up_cooldown: f32,
    /// Seconds per gear shed while braking
    pub brake_interval: f32,
    /// Multiplier applied while a lane change is in progress
    pub lane_change_boost: f32,
    pub half_extents: Vec3,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            lane_change_speed: 18.0,
            snap_epsilon: 0.01,
            gear_increment: 0.25,
            max_gear: 5,
            gear_up_cooldown: 0.2,
            brake_interval: 0.35,
            lane_change_boost: 1.1,
            half_extents: Vec3::new(0.8, 0.6, 1.8),
        }
    }
}

/// Scroll and traffic speeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    /// Road scroll speed in gear 1 (world units/s)
    pub base_scroll_speed: f32,
    /// Oncoming traffic's own speed, added to the player's scroll speed
    pub oncoming_closing_speed: f32,
    /// Obstacles this far behind the player are retired
    pub despawn_behind: f32,
    /// Obstacles further ahead than this are retired
    pub max_lookahead: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            base_scroll_speed: 20.0,
            oncoming_closing_speed: 15.0,
            despawn_behind: 10.0,
            max_lookahead: 200.0,
        }
    }
}

/// Spawn gating, placement and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    pub mode: SpawnMode,
    /// Kind selection weights, must sum to 1
    pub weights: PerKind<f32>,
    /// Lane for same-direction traffic
    pub same_direction_lane: Lane,
    /// Lane for oncoming traffic
    pub oncoming_lane: Lane,
    /// Distance ahead of the player new obstacles appear at
    pub spawn_distance: f32,
    /// Maximum random offset applied to the spawn distance
    pub spawn_jitter: f32,
    /// Depth of the look-ahead zone used for density counting
    pub zone_depth: f32,
    /// Seconds between density checks
    pub density_check_interval: f32,
    /// Seconds between spawns in timer and wave modes, before tier scaling
    pub base_spawn_interval: f32,
    /// Candidates drawn per cycle
    pub attempts_per_cycle: u32,
    /// Candidates drawn per wave in wave mode
    pub wave_size: u32,
    pub same_lane_spacing: f32,
    pub adjacent_lane_spacing: f32,
    pub opposite_shoulder_spacing: f32,
    /// Depth of road in which all four lanes may never be blocked at once
    pub clear_lane_window: f32,
    /// Seconds ahead the clear-lane check projects current motion
    pub passability_horizon: f32,
    /// Projection sample step in seconds
    pub passability_step: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            mode: SpawnMode::Density,
            weights: PerKind::new(0.4, 0.3, 0.3),
            same_direction_lane: Lane::SAME_DIRECTION,
            oncoming_lane: Lane::ONCOMING,
            spawn_distance: 120.0,
            spawn_jitter: 6.0,
            zone_depth: 130.0,
            density_check_interval: 0.25,
            base_spawn_interval: 1.2,
            attempts_per_cycle: 3,
            wave_size: 4,
            same_lane_spacing: 12.0,
            adjacent_lane_spacing: 8.0,
            opposite_shoulder_spacing: 20.0,
            clear_lane_window: 10.0,
            passability_horizon: 6.0,
            passability_step: 0.1,
        }
    }
}

/// Pool sizing and cosmetic variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolTuning {
    /// Upper bound on instances ever constructed per kind
    pub max_per_kind: PerKind<u32>,
    /// Number of visual variants per kind
    pub variants: PerKind<u8>,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max_per_kind: PerKind::new(24, 16, 16),
            variants: PerKind::new(3, 4, 4),
        }
    }
}

/// Score accrual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Points per world unit travelled
    pub points_per_unit: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            points_per_unit: 1.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub motion: MotionTuning,
    pub spawn: SpawnTuning,
    pub pool: PoolTuning,
    pub scoring: ScoringTuning,
    pub tiers: Vec<DifficultyTier>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            motion: MotionTuning::default(),
            spawn: SpawnTuning::default(),
            pool: PoolTuning::default(),
            scoring: ScoringTuning::default(),
            tiers: default_tiers(),
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning table. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a tuning file
    pub fn from_file(path: &Path) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read a tuning file, falling back to defaults if it is missing or invalid
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(err) => {
                log::warn!("Using default tuning ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.spawn.weights;
        if w.stationary < 0.0 || w.same_direction < 0.0 || w.oncoming < 0.0 {
            return Err(TuningError::NegativeWeight);
        }
        let sum = w.stationary + w.same_direction + w.oncoming;
        if (sum - 1.0).abs() > 1e-3 {
            return Err(TuningError::WeightsNotNormalized { sum });
        }

        let first = self.tiers.first().ok_or(TuningError::EmptyTierTable)?;
        if first.score_threshold != 0 {
            return Err(TuningError::FirstTierNotZero {
                threshold: first.score_threshold,
            });
        }
        for (index, pair) in self.tiers.windows(2).enumerate() {
            if pair[1].score_threshold <= pair[0].score_threshold {
                return Err(TuningError::TiersNotAscending { index: index + 1 });
            }
        }

        let positive = [
            ("player.lane_change_speed", self.player.lane_change_speed),
            ("player.snap_epsilon", self.player.snap_epsilon),
            ("player.brake_interval", self.player.brake_interval),
            ("motion.base_scroll_speed", self.motion.base_scroll_speed),
            ("motion.max_lookahead", self.motion.max_lookahead),
            ("spawn.spawn_distance", self.spawn.spawn_distance),
            ("spawn.zone_depth", self.spawn.zone_depth),
            ("spawn.density_check_interval", self.spawn.density_check_interval),
            ("spawn.base_spawn_interval", self.spawn.base_spawn_interval),
            ("spawn.clear_lane_window", self.spawn.clear_lane_window),
            ("spawn.passability_step", self.spawn.passability_step),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v <= 0.0) {
            return Err(TuningError::NonPositive { field: *field });
        }
        if self.player.max_gear == 0 {
            return Err(TuningError::NonPositive {
                field: "player.max_gear",
            });
        }
        if self.tiers.iter().any(|t| t.spawn_interval_factor <= 0.0) {
            return Err(TuningError::NonPositive {
                field: "tiers.spawn_interval_factor",
            });
        }

        if self.spawn.attempts_per_cycle == 0 || self.spawn.wave_size == 0 {
            return Err(TuningError::ZeroAttempts);
        }
        let caps = &self.pool.max_per_kind;
        if caps.stationary == 0 || caps.same_direction == 0 || caps.oncoming == 0 {
            return Err(TuningError::ZeroPoolCapacity);
        }

        // The farthest a fresh spawn can land ahead of the player
        let farthest_spawn = self.spawn.spawn_distance + self.spawn.spawn_jitter.max(0.0);
        if self.spawn.zone_depth < farthest_spawn {
            return Err(TuningError::ZoneTooShallow {
                zone_depth: self.spawn.zone_depth,
                farthest_spawn,
            });
        }
        if self.motion.max_lookahead < farthest_spawn {
            return Err(TuningError::LookaheadTooShort {
                max_lookahead: self.motion.max_lookahead,
                farthest_spawn,
            });
        }
        if self.spawn.adjacent_lane_spacing > self.spawn.same_lane_spacing {
            return Err(TuningError::AdjacentSpacingTooWide {
                adjacent: self.spawn.adjacent_lane_spacing,
                same_lane: self.spawn.same_lane_spacing,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_keeps_tiers() {
        let tuning = Tuning::default();
        let json = tuning.to_json().expect("serialize");
        let parsed = Tuning::from_json(&json).expect("parse");
        assert_eq!(parsed, tuning);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let tuning = Tuning::from_json(r#"{ "motion": { "base_scroll_speed": 30.0 } }"#)
            .expect("parse");
        assert_eq!(tuning.motion.base_scroll_speed, 30.0);
        assert_eq!(tuning.motion.oncoming_closing_speed, 15.0);
        assert_eq!(tuning.tiers.len(), 5);
    }

    #[test]
    fn test_rejects_unnormalized_weights() {
        let mut tuning = Tuning::default();
        tuning.spawn.weights = PerKind::new(0.5, 0.5, 0.5);
        let json = serde_json::to_string(&tuning).expect("serialize");
        assert!(matches!(
            Tuning::from_json(&json),
            Err(TuningError::WeightsNotNormalized { .. })
        ));
    }

    #[test]
    fn test_rejects_unsorted_tiers() {
        let mut tuning = Tuning::default();
        tuning.tiers.swap(1, 2);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::TiersNotAscending { index: 2 })
        ));
    }

    #[test]
    fn test_rejects_zone_shallower_than_spawn_band() {
        let mut tuning = Tuning::default();
        tuning.spawn.zone_depth = 100.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::ZoneTooShallow { .. })
        ));
        // The far edge of the jitter band itself is fine
        tuning.spawn.zone_depth = 126.0;
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_rejects_lookahead_inside_spawn_band() {
        let mut tuning = Tuning::default();
        tuning.motion.max_lookahead = 110.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::LookaheadTooShort { .. })
        ));
    }

    #[test]
    fn test_rejects_adjacent_spacing_wider_than_same_lane() {
        let mut tuning = Tuning::default();
        tuning.spawn.adjacent_lane_spacing = 15.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::AdjacentSpacingTooWide { .. })
        ));
        tuning.spawn.adjacent_lane_spacing = tuning.spawn.same_lane_spacing;
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_lane() {
        let json = r#"{ "spawn": { "oncoming_lane": 9 } }"#;
        assert!(matches!(Tuning::from_json(json), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let tuning = Tuning::load(Path::new("/definitely/not/here.json"));
        assert_eq!(tuning, Tuning::default());
    }
}
