//! Id-ordered registries for movers and obstacles.

use std::collections::BTreeMap;

use nv_core::{MoverId, NavError, NavResult, ObstacleId, Tick, Triangle, Vec3};

use crate::{Mover, MoverParams, Obstacle};

// ── MoverStore ────────────────────────────────────────────────────────────────

/// Canonical owner of every registered mover.
///
/// Ids are handed out sequentially from 0 and never reused, so a stale id
/// held elsewhere (a pathfinding result, a follow target) simply misses.
#[derive(Debug)]
pub struct MoverStore {
    movers:  BTreeMap<MoverId, Mover>,
    next_id: MoverId,
}

impl Default for MoverStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MoverStore {
    pub fn new() -> Self {
        Self { movers: BTreeMap::new(), next_id: MoverId(0) }
    }

    /// Register a new mover at `position` and return its id.
    pub fn insert(&mut self, position: Vec3, params: &MoverParams) -> MoverId {
        let id = self.next_id;
        self.next_id = id.next();
        self.movers.insert(id, Mover::new(id, position, params));
        id
    }

    /// Register a mover constructed elsewhere.  Its id must be unused.
    pub fn insert_mover(&mut self, mover: Mover) -> NavResult<()> {
        if self.movers.contains_key(&mover.id) {
            return Err(NavError::DuplicateMover(mover.id));
        }
        if mover.id >= self.next_id {
            self.next_id = mover.id.next();
        }
        self.movers.insert(mover.id, mover);
        Ok(())
    }

    pub fn remove(&mut self, id: MoverId) -> Option<Mover> {
        self.movers.remove(&id)
    }

    #[inline]
    pub fn get(&self, id: MoverId) -> Option<&Mover> {
        self.movers.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: MoverId) -> Option<&mut Mover> {
        self.movers.get_mut(&id)
    }

    /// Like [`get`](Self::get) but with a typed error.
    pub fn try_get(&self, id: MoverId) -> NavResult<&Mover> {
        self.movers.get(&id).ok_or(NavError::MoverNotFound(id))
    }

    pub fn try_get_mut(&mut self, id: MoverId) -> NavResult<&mut Mover> {
        self.movers.get_mut(&id).ok_or(NavError::MoverNotFound(id))
    }

    #[inline]
    pub fn contains(&self, id: MoverId) -> bool {
        self.movers.contains_key(&id)
    }

    /// All movers in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Mover> + '_ {
        self.movers.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Mover> + '_ {
        self.movers.values_mut()
    }

    /// Snapshot of all ids in ascending order.
    pub fn ids(&self) -> Vec<MoverId> {
        self.movers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.movers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }
}

// ── ObstacleStore ─────────────────────────────────────────────────────────────

/// Canonical owner of every obstacle triangle.
///
/// `version` increases on every add/update/remove so consumers (the planner
/// snapshot) can tell whether the geometry changed since they last looked.
#[derive(Debug)]
pub struct ObstacleStore {
    obstacles: BTreeMap<ObstacleId, Obstacle>,
    next_id:   ObstacleId,
    version:   u64,
}

impl Default for ObstacleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleStore {
    pub fn new() -> Self {
        Self { obstacles: BTreeMap::new(), next_id: ObstacleId(0), version: 0 }
    }

    pub fn insert(&mut self, triangle: Triangle, now: Tick) -> ObstacleId {
        let id = self.next_id;
        self.next_id = id.next();
        self.obstacles.insert(id, Obstacle::new(id, triangle, now));
        self.version += 1;
        id
    }

    /// Replace the geometry of an existing obstacle and stamp `now`.
    pub fn update(&mut self, id: ObstacleId, triangle: Triangle, now: Tick) -> NavResult<&Obstacle> {
        let obstacle = self.obstacles.get_mut(&id).ok_or(NavError::ObstacleNotFound(id))?;
        *obstacle = Obstacle::new(id, triangle, now);
        self.version += 1;
        Ok(obstacle)
    }

    pub fn remove(&mut self, id: ObstacleId) -> Option<Obstacle> {
        let removed = self.obstacles.remove(&id);
        if removed.is_some() {
            self.version += 1;
        }
        removed
    }

    #[inline]
    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(&id)
    }

    /// All obstacles in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> + '_ {
        self.obstacles.values()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}
