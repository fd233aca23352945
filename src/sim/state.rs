//! Game session state
//!
//! One `GameState` owns every service a run needs (player, difficulty, pool,
//! spawner, RNG, asset lookup). Nothing is process-wide, so sessions can be
//! created, reset and tested independently.

use std::fmt;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyController;
use super::lanes::Lane;
use super::motion::MotionContext;
use super::obstacle::{ObstacleId, ObstacleKind};
use super::player::Player;
use super::pool::{NoVisuals, ObstaclePool, VisualSource};
use super::spawn::SpawnEngine;
use crate::consts::{PLAYER_Z, SIM_DT};
use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Game is paused
    Paused,
    /// Run ended by a collision
    GameOver,
}

/// Game events for the UI/audio collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The player hit an obstacle; the run is over
    Collision { kind: ObstacleKind },
    /// Score crossed into a new difficulty tier
    TierChanged { level: u32, name: String },
    GearChanged { gear: u32 },
    /// An instance was placed on the road; attach its visual
    ObstacleSpawned {
        id: ObstacleId,
        kind: ObstacleKind,
        lane: Lane,
    },
    /// An instance left the road and went back to the pool
    ObstacleRecycled { id: ObstacleId },
}

/// Snapshot of what the HUD shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    /// Score gained per fixed frame at the current speed
    pub score_rate: f32,
    pub distance: f32,
    pub gear: u32,
    pub speed_multiplier: f32,
    pub tier_level: u32,
    pub tier_name: String,
    pub phase: GamePhase,
}

/// Complete session state (deterministic for a given seed, tuning and input)
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Spawn randomness (kind, lane, jitter)
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub player: Player,
    pub difficulty: DifficultyController,
    pub pool: ObstaclePool,
    pub spawner: SpawnEngine,
    /// Asset collaborator used when the pool builds new instances
    pub visuals: Box<dyn VisualSource>,
    pub score: u64,
    /// World units travelled this run
    pub distance: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Z of the player/camera anchor
    pub player_z: f32,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a session with the default tuning and placeholder visuals
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, Tuning::default(), Box::new(NoVisuals))
    }

    pub fn with_config(seed: u64, tuning: Tuning, visuals: Box<dyn VisualSource>) -> Self {
        log::info!(
            "New session: seed={}, spawn mode {:?}, {} tiers",
            seed,
            tuning.spawn.mode,
            tuning.tiers.len()
        );
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            player: Player::new(tuning.player.clone()),
            difficulty: DifficultyController::new(tuning.tiers.clone()),
            pool: ObstaclePool::with_seed(tuning.pool.clone(), seed),
            spawner: SpawnEngine::new(tuning.spawn.clone()),
            visuals,
            score: 0,
            distance: 0.0,
            time_ticks: 0,
            player_z: PLAYER_Z,
            events: Vec::new(),
            tuning,
        }
    }

    /// Start the run over. Player, obstacles, spawner and difficulty are
    /// reset together and the RNG is reseeded, so a reset session replays
    /// exactly like a fresh one.
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.phase = GamePhase::Playing;
        self.player.reset();
        self.difficulty.reset();
        self.pool.reset();
        self.spawner.reset();
        self.score = 0;
        self.distance = 0.0;
        self.time_ticks = 0;
        self.player_z = PLAYER_Z;
        self.events.clear();
        log::info!("Session reset (seed={})", self.seed);
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Frame-wide speed inputs for the current gear and tier
    pub fn motion_context(&self) -> MotionContext {
        MotionContext::new(
            &self.tuning.motion,
            self.player.speed_multiplier(),
            self.difficulty.current(),
        )
    }

    pub fn hud(&self) -> Hud {
        let tier = self.difficulty.current();
        let speed_multiplier = self.player.speed_multiplier();
        Hud {
            score: self.score,
            score_rate: self.motion_context().scroll_speed
                * SIM_DT
                * self.tuning.scoring.points_per_unit,
            distance: self.distance,
            gear: self.player.gear,
            speed_multiplier,
            tier_level: tier.level,
            tier_name: tier.name.clone(),
            phase: self.phase,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("seed", &self.seed)
            .field("phase", &self.phase)
            .field("score", &self.score)
            .field("time_ticks", &self.time_ticks)
            .field("player", &self.player)
            .field("active_obstacles", &self.pool.active_len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::player::Intent;
    use rand::Rng;

    #[test]
    fn test_new_session() {
        let state = GameState::new(7);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.current_lane, Lane::SAME_DIRECTION);
        assert_eq!(state.player.gear, 1);
        assert_eq!(state.pool.active_len(), 0);
        assert_eq!(state.difficulty.current().level, 1);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_reset_twice_matches_reset_once() {
        let mut state = GameState::new(42);
        state.player.apply(Intent::GearUp);
        state.player.apply(Intent::MoveRight);
        state.player.update(0.1);
        let id = state
            .pool
            .acquire(ObstacleKind::Oncoming, &NoVisuals)
            .unwrap();
        state.pool.activate(id, Lane::ONCOMING, -40.0);
        state.score = 900;
        state.difficulty.update(900);
        state.phase = GamePhase::GameOver;

        state.reset();
        let once = (
            state.player.current_lane,
            state.player.gear,
            state.pool.active_len(),
            state.difficulty.current().level,
            state.rng.clone().random::<u32>(),
        );
        state.reset();
        let twice = (
            state.player.current_lane,
            state.player.gear,
            state.pool.active_len(),
            state.difficulty.current().level,
            state.rng.clone().random::<u32>(),
        );
        assert_eq!(once, twice);
        assert_eq!(once.0, Lane::SAME_DIRECTION);
        assert_eq!(once.1, 1);
        assert_eq!(once.2, 0);
        assert_eq!(once.3, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = GameState::new(1);
        state.events.push(GameEvent::GearChanged { gear: 2 });
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_hud_reflects_gear_and_tier() {
        let mut state = GameState::new(1);
        state.player.apply(Intent::GearUp);
        let hud = state.hud();
        assert_eq!(hud.gear, 2);
        assert!((hud.speed_multiplier - 1.25).abs() < 1e-6);
        // 25 u/s over one 1/60 s frame
        assert!((hud.score_rate - 25.0 / 60.0).abs() < 1e-5);
        assert_eq!(hud.tier_level, 1);
        assert_eq!(hud.tier_name, "Cruise");
        assert_eq!(hud.phase, GamePhase::Playing);
    }
}
