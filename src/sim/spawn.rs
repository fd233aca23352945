//! Obstacle spawn engine
//!
//! Decides when, what and where to spawn. Every candidate is checked against
//! the active set for spacing and for the clear-lane guarantee before an
//! instance is taken from the pool; a refused candidate is simply skipped.
//!
//! Three gating modes:
//! - `Density`: every short interval, top the look-ahead zone up to the tier's
//!   target density (self-regulating, the default)
//! - `Timer`: one obstacle per tier-scaled interval
//! - `Wave`: several candidates per tier-scaled interval, committed together

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyTier;
use super::lanes::{Lane, LaneSet};
use super::motion::{MotionContext, speed_for};
use super::obstacle::{Obstacle, ObstacleId, ObstacleKind, PerKind};
use super::pool::{ObstaclePool, VisualSource};
use crate::error::SpawnRejection;
use crate::tuning::SpawnTuning;

/// Spawn gating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpawnMode {
    #[default]
    Density,
    Timer,
    Wave,
}

/// Cumulative-distribution sampler over weighted entries
#[derive(Debug, Clone)]
pub struct WeightTable<T> {
    /// (entry, cumulative weight), ascending
    entries: Vec<(T, f32)>,
    total: f32,
}

impl<T: Copy> WeightTable<T> {
    pub fn new(weights: impl IntoIterator<Item = (T, f32)>) -> Self {
        let mut total = 0.0;
        let entries = weights
            .into_iter()
            .map(|(item, weight)| {
                total += weight.max(0.0);
                (item, total)
            })
            .collect();
        Self { entries, total }
    }

    /// Entry for a roll in [0, 1). Zero-weight entries are never picked.
    pub fn pick(&self, roll: f32) -> Option<T> {
        if self.total <= 0.0 {
            return None;
        }
        let target = roll.clamp(0.0, 1.0) * self.total;
        self.entries
            .iter()
            .find(|&&(_, cumulative)| target < cumulative)
            .or_else(|| {
                // roll == 1.0: last entry that carries weight
                let mut previous = 0.0;
                self.entries
                    .iter()
                    .filter(|&&(_, cumulative)| {
                        let carries = cumulative > previous;
                        previous = cumulative;
                        carries
                    })
                    .last()
            })
            .map(|&(item, _)| item)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<T> {
        self.pick(rng.random::<f32>())
    }
}

impl WeightTable<ObstacleKind> {
    pub fn for_kinds(weights: &PerKind<f32>) -> Self {
        Self::new(ObstacleKind::ALL.map(|kind| (kind, *weights.get(kind))))
    }
}

/// A proposed (or already placed) obstacle position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub kind: ObstacleKind,
    pub lane: Lane,
    pub z: f32,
}

impl From<&Obstacle> for Candidate {
    fn from(o: &Obstacle) -> Self {
        Self {
            kind: o.kind,
            lane: o.lane,
            z: o.z(),
        }
    }
}

/// Outcome of one spawn cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpawnReport {
    /// Candidates drawn
    pub attempts: u32,
    pub spawned: Vec<(ObstacleId, Candidate)>,
    pub rejected: Vec<SpawnRejection>,
    /// Wave candidates removed to keep a lane clear
    pub dropped: u32,
}

impl SpawnReport {
    pub fn is_idle(&self) -> bool {
        self.attempts == 0
    }
}

/// Result of resolving a drafted wave
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WavePlan {
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<(Candidate, SpawnRejection)>,
    /// Candidate removed because the wave claimed every lane
    pub dropped: Option<Candidate>,
}

/// Per-frame inputs to the spawn engine
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext<'a> {
    pub player_z: f32,
    pub tier: &'a DifficultyTier,
    pub motion: MotionContext,
}

/// True if some stretch of road `window` deep has an obstacle in every lane.
/// With `anchor`, only stretches containing that Z are considered.
pub fn all_lanes_blocked(points: &[(Lane, f32)], window: f32, anchor: Option<f32>) -> bool {
    points.iter().map(|&(_, z)| z).chain(anchor).any(|start| {
        let end = start + window;
        if anchor.is_some_and(|a| a < start || a > end) {
            return false;
        }
        let mut lanes = LaneSet::default();
        for &(lane, z) in points {
            if z >= start && z <= end {
                lanes.insert(lane);
            }
        }
        lanes.is_full()
    })
}

/// Spawn engine state
#[derive(Debug, Clone)]
pub struct SpawnEngine {
    tuning: SpawnTuning,
    weights: WeightTable<ObstacleKind>,
    /// Seconds accumulated toward the next gate
    timer: f32,
}

impl SpawnEngine {
    pub fn new(tuning: SpawnTuning) -> Self {
        let weights = WeightTable::for_kinds(&tuning.weights);
        Self {
            tuning,
            weights,
            timer: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.timer = 0.0;
    }

    pub fn mode(&self) -> SpawnMode {
        self.tuning.mode
    }

    pub fn tuning(&self) -> &SpawnTuning {
        &self.tuning
    }

    /// Obstacles the look-ahead zone should hold for `tier`
    pub fn density_target(&self, tier: &DifficultyTier) -> f32 {
        tier.target_density * (self.tuning.zone_depth / 100.0)
    }

    /// Active obstacles between the player and the far edge of the zone
    pub fn count_in_zone(&self, pool: &ObstaclePool, player_z: f32) -> usize {
        pool.iter_active()
            .filter(|o| self.in_zone(o.z(), player_z))
            .count()
    }

    fn in_zone(&self, z: f32, player_z: f32) -> bool {
        z <= player_z && z >= player_z - self.tuning.zone_depth
    }

    /// Advance the gate and run a spawn cycle when it opens
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        ctx: &SpawnContext<'_>,
        pool: &mut ObstaclePool,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> SpawnReport {
        self.timer += dt;
        let interval = match self.tuning.mode {
            SpawnMode::Density => self.tuning.density_check_interval,
            SpawnMode::Timer | SpawnMode::Wave => {
                self.tuning.base_spawn_interval * ctx.tier.spawn_interval_factor
            }
        };
        if self.timer < interval {
            return SpawnReport::default();
        }
        // One cycle per gate; a long frame does not trigger a burst
        self.timer = (self.timer - interval).min(interval);

        let report = match self.tuning.mode {
            SpawnMode::Density => self.density_cycle(ctx, pool, rng, visuals),
            SpawnMode::Timer => self.timer_cycle(ctx, pool, rng, visuals),
            SpawnMode::Wave => self.wave_cycle(ctx, pool, rng, visuals),
        };
        if !report.spawned.is_empty() || !report.rejected.is_empty() {
            log::debug!(
                "Spawn cycle ({:?}): {} attempts, {} spawned, {} rejected, {} dropped",
                self.tuning.mode,
                report.attempts,
                report.spawned.len(),
                report.rejected.len(),
                report.dropped
            );
        }
        report
    }

    fn density_cycle<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        pool: &mut ObstaclePool,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        let target = self.density_target(ctx.tier);
        let mut in_zone = self.count_in_zone(pool, ctx.player_z);

        for _ in 0..self.tuning.attempts_per_cycle {
            if in_zone as f32 >= target {
                break;
            }
            report.attempts += 1;
            match self.try_spawn(ctx, pool, rng, visuals) {
                Ok((id, candidate)) => {
                    if self.in_zone(candidate.z, ctx.player_z) {
                        in_zone += 1;
                    }
                    report.spawned.push((id, candidate));
                }
                Err(reason) => report.rejected.push(reason),
            }
        }
        report
    }

    fn timer_cycle<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        pool: &mut ObstaclePool,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        for _ in 0..self.tuning.attempts_per_cycle {
            report.attempts += 1;
            match self.try_spawn(ctx, pool, rng, visuals) {
                Ok(spawned) => {
                    report.spawned.push(spawned);
                    break;
                }
                Err(reason) => report.rejected.push(reason),
            }
        }
        report
    }

    fn wave_cycle<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        pool: &mut ObstaclePool,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();
        let mut drafted = Vec::with_capacity(self.tuning.wave_size as usize);
        for _ in 0..self.tuning.wave_size {
            report.attempts += 1;
            match self.draw_candidate(rng, ctx.player_z) {
                Some(candidate) => drafted.push(candidate),
                None => report.rejected.push(SpawnRejection::NoKindWeight),
            }
        }
        let active: Vec<Candidate> = pool.iter_active().map(Candidate::from).collect();

        let plan = self.resolve_wave(drafted, &active, ctx);
        report
            .rejected
            .extend(plan.rejected.iter().map(|&(_, reason)| reason));
        report.dropped = u32::from(plan.dropped.is_some());

        for candidate in plan.accepted {
            match Self::commit(candidate, pool, visuals) {
                Ok(id) => report.spawned.push((id, candidate)),
                Err(reason) => report.rejected.push(reason),
            }
        }
        report
    }

    /// Validate a drafted wave. Each candidate is checked against the active
    /// set and the candidates accepted before it. Then, if the wave would claim
    /// all four lanes, the last accepted candidate is dropped. Finally each
    /// survivor must keep a lane clear given everything else.
    pub fn resolve_wave(
        &self,
        drafted: Vec<Candidate>,
        active: &[Candidate],
        ctx: &SpawnContext<'_>,
    ) -> WavePlan {
        let mut plan = WavePlan::default();

        let mut validated: Vec<Candidate> = Vec::with_capacity(drafted.len());
        for candidate in drafted {
            let result = self.validate_spacing(&candidate, active.iter().chain(&validated));
            match result {
                Ok(()) => validated.push(candidate),
                Err(reason) => plan.rejected.push((candidate, reason)),
            }
        }

        let mut claimed = LaneSet::default();
        for candidate in &validated {
            claimed.insert(candidate.lane);
        }
        if claimed.is_full() {
            plan.dropped = validated.pop();
            if let Some(dropped) = plan.dropped {
                log::debug!(
                    "Wave claimed every lane, dropping {} in lane {}",
                    dropped.kind.as_str(),
                    dropped.lane.index()
                );
            }
        }

        for candidate in validated {
            let mut others: Vec<Candidate> = active.to_vec();
            others.extend(plan.accepted.iter().copied());
            if self.stays_passable(&candidate, &others, ctx) {
                plan.accepted.push(candidate);
            } else {
                plan.rejected.push((candidate, SpawnRejection::NoClearLane));
            }
        }
        plan
    }

    /// Draw, validate and place a single obstacle
    fn try_spawn<R: Rng + ?Sized>(
        &self,
        ctx: &SpawnContext<'_>,
        pool: &mut ObstaclePool,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> Result<(ObstacleId, Candidate), SpawnRejection> {
        let candidate = self
            .draw_candidate(rng, ctx.player_z)
            .ok_or(SpawnRejection::NoKindWeight)?;
        let active: Vec<Candidate> = pool.iter_active().map(Candidate::from).collect();

        self.check(&candidate, &active, ctx).inspect_err(|reason| {
            log::trace!(
                "Rejected {} at lane {} z={:.1}: {}",
                candidate.kind.as_str(),
                candidate.lane.index(),
                candidate.z,
                reason
            );
        })?;

        let id = Self::commit(candidate, pool, visuals)?;
        Ok((id, candidate))
    }

    /// Full placement check for one candidate against placed obstacles
    pub fn check(
        &self,
        candidate: &Candidate,
        placed: &[Candidate],
        ctx: &SpawnContext<'_>,
    ) -> Result<(), SpawnRejection> {
        self.validate_spacing(candidate, placed.iter())?;
        if !self.stays_passable(candidate, placed, ctx) {
            return Err(SpawnRejection::NoClearLane);
        }
        Ok(())
    }

    fn commit(
        candidate: Candidate,
        pool: &mut ObstaclePool,
        visuals: &dyn VisualSource,
    ) -> Result<ObstacleId, SpawnRejection> {
        let id = pool
            .acquire(candidate.kind, visuals)
            .ok_or(SpawnRejection::PoolExhausted)?;
        pool.activate(id, candidate.lane, candidate.z);
        log::debug!(
            "Spawned {} in lane {} at z={:.1}",
            candidate.kind.as_str(),
            candidate.lane.index(),
            candidate.z
        );
        Ok(id)
    }

    /// Weighted kind, kind-mapped lane and jittered spawn Z
    pub fn draw_candidate<R: Rng + ?Sized>(&self, rng: &mut R, player_z: f32) -> Option<Candidate> {
        let kind = self.weights.sample(rng)?;
        let lane = self.lane_for(kind, rng);
        let jitter = if self.tuning.spawn_jitter > 0.0 {
            rng.random_range(-self.tuning.spawn_jitter..=self.tuning.spawn_jitter)
        } else {
            0.0
        };
        Some(Candidate {
            kind,
            lane,
            z: player_z - self.tuning.spawn_distance + jitter,
        })
    }

    /// Static obstacles take a random shoulder, traffic its fixed lane
    pub fn lane_for<R: Rng + ?Sized>(&self, kind: ObstacleKind, rng: &mut R) -> Lane {
        match kind {
            ObstacleKind::Static => {
                if rng.random_bool(0.5) {
                    Lane::LEFT_SHOULDER
                } else {
                    Lane::RIGHT_SHOULDER
                }
            }
            ObstacleKind::SameDirection => self.tuning.same_direction_lane,
            ObstacleKind::Oncoming => self.tuning.oncoming_lane,
        }
    }

    /// Spacing rules against each placed obstacle
    pub fn validate_spacing<'a>(
        &self,
        candidate: &Candidate,
        placed: impl Iterator<Item = &'a Candidate>,
    ) -> Result<(), SpawnRejection> {
        for other in placed {
            let dz = (candidate.z - other.z).abs();
            if candidate.lane == other.lane && dz < self.tuning.same_lane_spacing {
                return Err(SpawnRejection::SameLaneSpacing);
            }
            if candidate.lane.is_adjacent(other.lane) && dz < self.tuning.adjacent_lane_spacing {
                return Err(SpawnRejection::AdjacentLaneSpacing);
            }
            if candidate.kind == ObstacleKind::Static
                && other.kind == ObstacleKind::Static
                && candidate.lane.is_opposite_shoulder(other.lane)
                && dz < self.tuning.opposite_shoulder_spacing
            {
                return Err(SpawnRejection::OppositeShoulders);
            }
        }
        Ok(())
    }

    /// Project the candidate and every placed obstacle forward at current
    /// speeds until the candidate reaches the player (or the horizon ends).
    /// Fails if at any sample the candidate completes a four-lane block.
    pub fn stays_passable(
        &self,
        candidate: &Candidate,
        placed: &[Candidate],
        ctx: &SpawnContext<'_>,
    ) -> bool {
        let step = self.tuning.passability_step;
        let steps = (self.tuning.passability_horizon / step).ceil().max(0.0) as usize;
        let candidate_speed = speed_for(candidate.kind, &ctx.motion);
        let mut points: Vec<(Lane, f32)> = Vec::with_capacity(placed.len() + 1);

        for s in 0..=steps {
            let t = s as f32 * step;
            let cz = candidate.z + candidate_speed * t;
            if cz > ctx.player_z {
                break;
            }
            points.clear();
            points.push((candidate.lane, cz));
            points.extend(placed.iter().filter_map(|p| {
                let z = p.z + speed_for(p.kind, &ctx.motion) * t;
                self.in_zone(z, ctx.player_z).then_some((p.lane, z))
            }));
            if all_lanes_blocked(&points, self.tuning.clear_lane_window, Some(cz)) {
                return false;
            }
        }
        true
    }

    /// No stretch of the look-ahead zone has all four lanes blocked
    pub fn has_clear_lane(&self, pool: &ObstaclePool, player_z: f32) -> bool {
        let points: Vec<(Lane, f32)> = pool
            .iter_active()
            .filter(|o| self.in_zone(o.z(), player_z))
            .map(|o| (o.lane, o.z()))
            .collect();
        !all_lanes_blocked(&points, self.tuning.clear_lane_window, None)
    }
}

impl Default for SpawnEngine {
    fn default() -> Self {
        Self::new(SpawnTuning::default())
    }
}
