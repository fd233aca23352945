//! Score-driven difficulty tiers
//!
//! A stepped, monotonic mapping from cumulative score to a tier. The controller
//! only reports transitions; reacting to them (UI flash, sound) is the caller's job.

use serde::{Deserialize, Serialize};

/// One row of the difficulty table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyTier {
    /// Lowest score at which this tier applies
    pub score_threshold: u64,
    /// 1-based level shown to the player
    pub level: u32,
    pub name: String,
    /// Obstacles per 100 world units of look-ahead zone
    pub target_density: f32,
    /// Same-direction traffic speed relative to scroll, in (-1, 0]
    pub speed_factor: f32,
    /// Multiplier on the base spawn interval (timer and wave modes)
    pub spawn_interval_factor: f32,
}

impl DifficultyTier {
    pub fn new(
        score_threshold: u64,
        level: u32,
        name: &str,
        target_density: f32,
        speed_factor: f32,
        spawn_interval_factor: f32,
    ) -> Self {
        Self {
            score_threshold,
            level,
            name: name.to_string(),
            target_density,
            speed_factor,
            spawn_interval_factor,
        }
    }
}

/// Shipped tier table
pub fn default_tiers() -> Vec<DifficultyTier> {
    vec![
        DifficultyTier::new(0, 1, "Cruise", 3.0, -0.30, 1.0),
        DifficultyTier::new(500, 2, "Traffic", 4.0, -0.25, 0.85),
        DifficultyTier::new(1500, 3, "Rush Hour", 5.0, -0.20, 0.7),
        DifficultyTier::new(3500, 4, "Highway", 6.0, -0.15, 0.6),
        DifficultyTier::new(7000, 5, "Insane", 7.5, -0.10, 0.5),
    ]
}

/// Tracks the current tier for a run
#[derive(Debug, Clone)]
pub struct DifficultyController {
    /// Ordered ascending by threshold, first threshold is 0
    tiers: Vec<DifficultyTier>,
    current: usize,
}

impl DifficultyController {
    /// Build from a validated tier table (see `Tuning::validate`)
    pub fn new(tiers: Vec<DifficultyTier>) -> Self {
        let tiers = if tiers.is_empty() {
            default_tiers()
        } else {
            tiers
        };
        Self { tiers, current: 0 }
    }

    /// Index of the highest tier whose threshold is at or below `score`
    fn index_for(&self, score: u64) -> usize {
        self.tiers
            .partition_point(|t| t.score_threshold <= score)
            .saturating_sub(1)
    }

    /// Pure lookup, does not touch the current tier
    pub fn tier_for(&self, score: u64) -> &DifficultyTier {
        &self.tiers[self.index_for(score)]
    }

    /// Re-sample the tier for `score`. Returns true when the tier changed.
    pub fn update(&mut self, score: u64) -> bool {
        let index = self.index_for(score);
        if index == self.current {
            return false;
        }
        self.current = index;
        log::info!(
            "Difficulty -> level {} ({}) at score {}",
            self.tiers[index].level,
            self.tiers[index].name,
            score
        );
        true
    }

    pub fn current(&self) -> &DifficultyTier {
        &self.tiers[self.current]
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }

    pub fn tiers(&self) -> &[DifficultyTier] {
        &self.tiers
    }
}

impl Default for DifficultyController {
    fn default() -> Self {
        Self::new(default_tiers())
    }
}
