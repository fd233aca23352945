//! Lane slots
//!
//! Four fixed slots across the road. 0 and 3 are shoulders (static obstacles
//! only), 1 carries oncoming traffic and 2 same-direction traffic.

use serde::{Deserialize, Serialize};

use crate::consts::{LANE_COUNT, LANE_X};

/// One of the four lane slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl Lane {
    pub const LEFT_SHOULDER: Lane = Lane(0);
    pub const ONCOMING: Lane = Lane(1);
    pub const SAME_DIRECTION: Lane = Lane(2);
    pub const RIGHT_SHOULDER: Lane = Lane(3);

    pub const ALL: [Lane; LANE_COUNT] = [
        Self::LEFT_SHOULDER,
        Self::ONCOMING,
        Self::SAME_DIRECTION,
        Self::RIGHT_SHOULDER,
    ];

    /// Lane for a slot index, `None` outside 0..=3
    pub fn new(index: u8) -> Option<Self> {
        ((index as usize) < LANE_COUNT).then_some(Lane(index))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Centre X offset of this lane
    #[inline]
    pub fn x(self) -> f32 {
        LANE_X[self.index()]
    }

    pub fn is_shoulder(self) -> bool {
        self == Self::LEFT_SHOULDER || self == Self::RIGHT_SHOULDER
    }

    /// Next lane to the left, clamped at the left shoulder
    pub fn left(self) -> Self {
        Lane(self.0.saturating_sub(1))
    }

    /// Next lane to the right, clamped at the right shoulder
    pub fn right(self) -> Self {
        Lane((self.0 + 1).min(LANE_COUNT as u8 - 1))
    }

    pub fn is_adjacent(self, other: Lane) -> bool {
        self.0.abs_diff(other.0) == 1
    }

    /// Both lanes are shoulders, on opposite sides of the road
    pub fn is_opposite_shoulder(self, other: Lane) -> bool {
        self.is_shoulder() && other.is_shoulder() && self != other
    }
}

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Lane::new(index).ok_or_else(|| format!("lane index {index} out of range 0..{LANE_COUNT}"))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> u8 {
        lane.0
    }
}

/// Per-lane flags, used when tracking which lanes a wave or window occupies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneSet([bool; LANE_COUNT]);

impl LaneSet {
    pub fn insert(&mut self, lane: Lane) {
        self.0[lane.index()] = true;
    }

    pub fn contains(&self, lane: Lane) -> bool {
        self.0[lane.index()]
    }

    pub fn len(&self) -> usize {
        self.0.iter().filter(|&&taken| taken).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == LANE_COUNT
    }

    /// Lanes not in the set
    pub fn clear_lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        Lane::ALL.into_iter().filter(|&lane| !self.contains(lane))
    }
}
