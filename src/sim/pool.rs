//! Obstacle pool / factory
//!
//! Arena of obstacle instances with one free-list per kind. Instances are only
//! constructed on a pool miss and are never dropped during a session. The
//! pool also owns the active set so an instance can never be active and free
//! at the same time.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::lanes::Lane;
use super::obstacle::{Obstacle, ObstacleId, ObstacleKind, PerKind, Visual, VisualHandle};
use crate::error::AssetError;
use crate::tuning::PoolTuning;

/// Asset collaborator: resolves a model variant to a renderer handle
pub trait VisualSource {
    fn visual(&self, kind: ObstacleKind, variant: u8) -> Result<VisualHandle, AssetError>;
}

/// Source with no assets at all; every obstacle gets a placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVisuals;

impl VisualSource for NoVisuals {
    fn visual(&self, kind: ObstacleKind, variant: u8) -> Result<VisualHandle, AssetError> {
        Err(AssetError::MissingVisual { kind, variant })
    }
}

/// Lookup table of loaded variants
#[derive(Debug, Clone, Default)]
pub struct VisualTable {
    handles: HashMap<(ObstacleKind, u8), VisualHandle>,
}

impl VisualTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every configured variant present, handles numbered in order
    pub fn with_variants(variants: &PerKind<u8>) -> Self {
        let mut table = Self::new();
        let mut next = 0u32;
        for kind in ObstacleKind::ALL {
            for variant in 0..*variants.get(kind) {
                table.insert(kind, variant, VisualHandle(next));
                next += 1;
            }
        }
        table
    }

    pub fn insert(&mut self, kind: ObstacleKind, variant: u8, handle: VisualHandle) {
        self.handles.insert((kind, variant), handle);
    }

    pub fn remove(&mut self, kind: ObstacleKind, variant: u8) {
        self.handles.remove(&(kind, variant));
    }
}

impl VisualSource for VisualTable {
    fn visual(&self, kind: ObstacleKind, variant: u8) -> Result<VisualHandle, AssetError> {
        self.handles
            .get(&(kind, variant))
            .copied()
            .ok_or(AssetError::MissingVisual { kind, variant })
    }
}

/// Type-keyed obstacle pool
#[derive(Debug, Clone)]
pub struct ObstaclePool {
    /// Every instance ever constructed, indexed by `ObstacleId`
    obstacles: Vec<Obstacle>,
    /// Marks instances currently sitting in a free-list
    in_free: Vec<bool>,
    free: PerKind<Vec<ObstacleId>>,
    /// Active set, in activation order
    active: Vec<ObstacleId>,
    created: PerKind<u32>,
    /// Cosmetic variant picks only; kept apart from the gameplay RNG so a
    /// pool miss never shifts the spawn sequence
    rng: Pcg32,
    tuning: PoolTuning,
}

impl ObstaclePool {
    pub fn new(tuning: PoolTuning) -> Self {
        Self::with_seed(tuning, 0)
    }

    pub fn with_seed(tuning: PoolTuning, seed: u64) -> Self {
        Self {
            obstacles: Vec::new(),
            in_free: Vec::new(),
            free: PerKind::default(),
            active: Vec::new(),
            created: PerKind::default(),
            rng: Pcg32::seed_from_u64(seed),
            tuning,
        }
    }

    /// Take an inactive instance of `kind`, constructing one on a pool miss.
    /// Returns `None` only when the kind's free-list is empty and its
    /// construction cap has been reached.
    pub fn acquire(
        &mut self,
        kind: ObstacleKind,
        visuals: &dyn VisualSource,
    ) -> Option<ObstacleId> {
        if let Some(id) = self.free.get_mut(kind).pop() {
            self.in_free[id.index()] = false;
            return Some(id);
        }

        if *self.created.get(kind) >= *self.tuning.max_per_kind.get(kind) {
            log::debug!("Pool exhausted for {} obstacles", kind.as_str());
            return None;
        }

        let id = ObstacleId(self.obstacles.len() as u32);
        let variant_count = *self.tuning.variants.get(kind);
        let visual = Self::pick_visual(kind, variant_count, &mut self.rng, visuals);
        self.obstacles.push(Obstacle::new(id, kind, visual));
        self.in_free.push(false);
        *self.created.get_mut(kind) += 1;
        log::debug!(
            "Constructed {} obstacle #{} ({})",
            kind.as_str(),
            id.0,
            if visual.is_placeholder() { "placeholder" } else { "model" }
        );
        Some(id)
    }

    /// Cosmetic variant choice; a missing asset degrades to a placeholder box
    fn pick_visual<R: Rng + ?Sized>(
        kind: ObstacleKind,
        variant_count: u8,
        rng: &mut R,
        visuals: &dyn VisualSource,
    ) -> Visual {
        if variant_count == 0 {
            return Visual::placeholder(kind);
        }
        let variant = rng.random_range(0..variant_count);
        match visuals.visual(kind, variant) {
            Ok(handle) => Visual::Model { variant, handle },
            Err(err) => {
                log::warn!("Falling back to placeholder: {}", err);
                Visual::placeholder(kind)
            }
        }
    }

    /// Spawn an acquired instance into the active set
    pub fn activate(&mut self, id: ObstacleId, lane: Lane, z: f32) {
        let Some(obstacle) = self.obstacles.get_mut(id.index()) else {
            return;
        };
        if obstacle.active || self.in_free[id.index()] {
            log::warn!("Refusing to activate obstacle #{} twice", id.0);
            return;
        }
        obstacle.spawn(lane, z);
        self.active.push(id);
    }

    /// Retire an instance: leave the active set first, then join the free-list
    pub fn release(&mut self, id: ObstacleId) {
        let index = id.index();
        if index >= self.obstacles.len() || self.in_free[index] {
            return;
        }
        if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        }
        let obstacle = &mut self.obstacles[index];
        obstacle.active = false;
        self.free.get_mut(obstacle.kind).push(id);
        self.in_free[index] = true;
    }

    /// Return every active instance to its free-list
    pub fn reset(&mut self) {
        let active = std::mem::take(&mut self.active);
        for id in active {
            self.release(id);
        }
    }

    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(id.index())
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, id: ObstacleId) -> Option<&mut Obstacle> {
        self.obstacles.get_mut(id.index())
    }

    /// Active instances in arena order, for in-place motion updates
    pub(crate) fn active_mut(&mut self) -> impl Iterator<Item = &mut Obstacle> + '_ {
        self.obstacles.iter_mut().filter(|o| o.active)
    }

    pub fn active_ids(&self) -> &[ObstacleId] {
        &self.active
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Obstacle> + '_ {
        self.active.iter().map(|id| &self.obstacles[id.index()])
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self, kind: ObstacleKind) -> usize {
        self.free.get(kind).len()
    }

    /// Instances constructed so far for `kind`
    pub fn created(&self, kind: ObstacleKind) -> u32 {
        *self.created.get(kind)
    }

    pub fn capacity(&self, kind: ObstacleKind) -> u32 {
        *self.tuning.max_per_kind.get(kind)
    }
}

impl Default for ObstaclePool {
    fn default() -> Self {
        Self::new(PoolTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_release_then_acquire_reuses_instance() {
        let mut pool = ObstaclePool::default();
        let id = pool.acquire(ObstacleKind::Oncoming, &NoVisuals).unwrap();
        pool.activate(id, Lane::ONCOMING, -100.0);
        pool.get_mut(id).unwrap().position.z = 3.0;
        pool.release(id);
        assert_eq!(pool.active_len(), 0);

        let again = pool.acquire(ObstacleKind::Oncoming, &NoVisuals).unwrap();
        assert_eq!(again, id);
        assert!(!pool.get(again).unwrap().active);

        pool.activate(again, Lane::ONCOMING, -77.5);
        let o = pool.get(again).unwrap();
        assert!(o.active);
        assert_eq!(o.position.x, Lane::ONCOMING.x());
        assert_eq!(o.position.z, -77.5);
        assert_eq!(o.age, 0.0);
        assert_eq!(pool.created(ObstacleKind::Oncoming), 1);
    }

    #[test]
    fn test_free_lists_are_per_kind() {
        let mut pool = ObstaclePool::default();
        let id = pool.acquire(ObstacleKind::Static, &NoVisuals).unwrap();
        pool.activate(id, Lane::LEFT_SHOULDER, -50.0);
        pool.release(id);
        let other = pool
            .acquire(ObstacleKind::SameDirection, &NoVisuals)
            .unwrap();
        assert_ne!(other, id);
        assert_eq!(pool.free_len(ObstacleKind::Static), 1);
        assert_eq!(pool.get(other).unwrap().kind, ObstacleKind::SameDirection);
    }

    #[test]
    fn test_double_release_is_ignored() {
        let mut pool = ObstaclePool::default();
        let id = pool.acquire(ObstacleKind::Static, &NoVisuals).unwrap();
        pool.activate(id, Lane::RIGHT_SHOULDER, -40.0);
        pool.release(id);
        pool.release(id);
        assert_eq!(pool.free_len(ObstacleKind::Static), 1);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let mut tuning = PoolTuning::default();
        tuning.max_per_kind = PerKind::new(1, 1, 1);
        let mut pool = ObstaclePool::new(tuning);
        let id = pool.acquire(ObstacleKind::Static, &NoVisuals).unwrap();
        pool.activate(id, Lane::LEFT_SHOULDER, -10.0);
        assert!(pool.acquire(ObstacleKind::Static, &NoVisuals).is_none());
        pool.release(id);
        assert_eq!(pool.acquire(ObstacleKind::Static, &NoVisuals), Some(id));
    }

    #[test]
    fn test_missing_asset_uses_placeholder() {
        let tuning = PoolTuning::default();
        let mut table = VisualTable::with_variants(&tuning.variants);
        for variant in 0..tuning.variants.oncoming {
            table.remove(ObstacleKind::Oncoming, variant);
        }
        let mut pool = ObstaclePool::new(tuning);

        let car = pool.acquire(ObstacleKind::Oncoming, &table).unwrap();
        assert_eq!(
            pool.get(car).unwrap().visual,
            Visual::placeholder(ObstacleKind::Oncoming)
        );

        let barrier = pool.acquire(ObstacleKind::Static, &table).unwrap();
        assert!(matches!(
            pool.get(barrier).unwrap().visual,
            Visual::Model { .. }
        ));
    }

    #[test]
    fn test_visual_survives_reuse() {
        let tuning = PoolTuning::default();
        let table = VisualTable::with_variants(&tuning.variants);
        let mut pool = ObstaclePool::new(tuning);
        let id = pool.acquire(ObstacleKind::SameDirection, &table).unwrap();
        let visual = pool.get(id).unwrap().visual;
        pool.activate(id, Lane::SAME_DIRECTION, -90.0);
        pool.release(id);
        let again = pool.acquire(ObstacleKind::SameDirection, &table).unwrap();
        assert_eq!(pool.get(again).unwrap().visual, visual);
    }

    #[test]
    fn test_reset_releases_everything() {
        let mut pool = ObstaclePool::default();
        for (i, kind) in ObstacleKind::ALL.into_iter().enumerate() {
            let id = pool.acquire(kind, &NoVisuals).unwrap();
            pool.activate(id, Lane::ALL[i], -20.0 * i as f32);
        }
        assert_eq!(pool.active_len(), 3);
        pool.reset();
        assert_eq!(pool.active_len(), 0);
        assert!(pool.iter_active().next().is_none());
        pool.reset();
        assert_eq!(pool.active_len(), 0);
        for kind in ObstacleKind::ALL {
            assert_eq!(pool.free_len(kind), 1);
        }
    }
}
