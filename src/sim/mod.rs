//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by obstacle ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod difficulty;
pub mod lanes;
pub mod motion;
pub mod obstacle;
pub mod player;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, CollisionHit, first_collision};
pub use difficulty::{DifficultyController, DifficultyTier, default_tiers};
pub use lanes::{Lane, LaneSet};
pub use motion::{MotionContext, speed_for};
pub use obstacle::{Obstacle, ObstacleId, ObstacleKind, PerKind, Visual, VisualHandle};
pub use player::{Intent, Player};
pub use pool::{NoVisuals, ObstaclePool, VisualSource, VisualTable};
pub use spawn::{Candidate, SpawnContext, SpawnEngine, SpawnMode, SpawnReport, WeightTable};
pub use state::{GameEvent, GamePhase, GameState, Hud};
pub use tick::{TickInput, tick};
