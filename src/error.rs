//! Error types
//!
//! Nothing in the simulation is fatal: asset failures fall back to placeholder
//! visuals and refused spawn candidates are simply skipped. These types exist so
//! callers (and tests) can see why.

use std::fmt;

use crate::sim::obstacle::ObstacleKind;

/// A visual variant could not be resolved by the asset collaborator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetError {
    MissingVisual { kind: ObstacleKind, variant: u8 },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVisual { kind, variant } => {
                write!(f, "no visual for {kind:?} variant {variant}")
            }
        }
    }
}

impl std::error::Error for AssetError {}

/// Why a single spawn candidate was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnRejection {
    /// Too close to an obstacle in the same lane
    SameLaneSpacing,
    /// Too close to an obstacle in a neighbouring lane
    AdjacentLaneSpacing,
    /// Would form a wall of static obstacles on both shoulders
    OppositeShoulders,
    /// Would leave no lane clear in the look-ahead window
    NoClearLane,
    /// No free instance and the pool is at capacity
    PoolExhausted,
    /// Every kind weight is zero, so no kind can be drawn
    NoKindWeight,
}

impl fmt::Display for SpawnRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameLaneSpacing => write!(f, "SAME_LANE_SPACING"),
            Self::AdjacentLaneSpacing => write!(f, "ADJACENT_LANE_SPACING"),
            Self::OppositeShoulders => write!(f, "OPPOSITE_SHOULDERS"),
            Self::NoClearLane => write!(f, "NO_CLEAR_LANE"),
            Self::PoolExhausted => write!(f, "POOL_EXHAUSTED"),
            Self::NoKindWeight => write!(f, "NO_KIND_WEIGHT"),
        }
    }
}

/// The tuning table is malformed
#[derive(Debug)]
pub enum TuningError {
    Parse(serde_json::Error),
    Io(std::io::Error),
    WeightsNotNormalized { sum: f32 },
    NegativeWeight,
    EmptyTierTable,
    TiersNotAscending { index: usize },
    FirstTierNotZero { threshold: u64 },
    NonPositive { field: &'static str },
    ZeroAttempts,
    ZeroPoolCapacity,
    ZoneTooShallow { zone_depth: f32, farthest_spawn: f32 },
    LookaheadTooShort { max_lookahead: f32, farthest_spawn: f32 },
    AdjacentSpacingTooWide { adjacent: f32, same_lane: f32 },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "tuning json is invalid: {err}"),
            Self::Io(err) => write!(f, "tuning file could not be read: {err}"),
            Self::WeightsNotNormalized { sum } => {
                write!(f, "kind weights must sum to 1.0, got {sum}")
            }
            Self::NegativeWeight => write!(f, "kind weights must be non-negative"),
            Self::EmptyTierTable => write!(f, "difficulty tier table is empty"),
            Self::TiersNotAscending { index } => {
                write!(f, "tier {index} threshold is not above the previous tier")
            }
            Self::FirstTierNotZero { threshold } => {
                write!(f, "first tier must start at score 0, starts at {threshold}")
            }
            Self::NonPositive { field } => write!(f, "{field} must be > 0"),
            Self::ZeroAttempts => write!(f, "spawn attempts per cycle must be > 0"),
            Self::ZeroPoolCapacity => write!(f, "pool capacity per kind must be > 0"),
            Self::ZoneTooShallow {
                zone_depth,
                farthest_spawn,
            } => write!(
                f,
                "spawn.zone_depth {zone_depth} stops short of spawns at {farthest_spawn}"
            ),
            Self::LookaheadTooShort {
                max_lookahead,
                farthest_spawn,
            } => write!(
                f,
                "motion.max_lookahead {max_lookahead} retires spawns at {farthest_spawn}"
            ),
            Self::AdjacentSpacingTooWide { adjacent, same_lane } => write!(
                f,
                "spawn.adjacent_lane_spacing {adjacent} exceeds same_lane_spacing {same_lane}"
            ),
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for TuningError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
