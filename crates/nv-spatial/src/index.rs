//! `SpatialIndex` — sparse hash grid of cubic buckets.
//!
//! # Lazy updates
//!
//! A mover is registered in exactly the buckets its bounding sphere
//! overlaps.  [`SpatialIndex::update_mover`] re-registers it only when its
//! [`IndexState`] is not `Indexed` or that bucket set changed.  Otherwise
//! only the cached position/radius used for exact distance filtering is
//! refreshed.  The set is recomputed only when the sphere's box spans
//! several buckets on two or more axes; otherwise the box range decides.
//!
//! # Versions
//!
//! `mover_version` / `obstacle_version` increase whenever bucket membership
//! changes.  Neighbour caches record the version they were filled against;
//! a mismatch means the cached candidate list may be missing someone.

use log::debug;
use rustc_hash::FxHashMap;

use nv_agent::{IndexState, Mover, Obstacle};
use nv_core::{MoverId, ObstacleId, Triangle, Vec3};

use crate::{BucketKey, BucketRange, SpatialError, SpatialResult};

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Bucket {
    movers:    Vec<MoverId>,
    obstacles: Vec<ObstacleId>,
}

impl Bucket {
    fn is_empty(&self) -> bool {
        self.movers.is_empty() && self.obstacles.is_empty()
    }
}

/// The index's view of a registered mover.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexedMover {
    pub position: Vec3,
    pub radius:   f32,
    /// Box range of the bounding sphere at registration.
    pub range:    BucketRange,
    /// Buckets the mover is currently registered in, in range order.
    pub buckets:  Vec<BucketKey>,
}

#[derive(Clone, Debug)]
struct IndexedObstacle {
    triangle: Triangle,
    range:    BucketRange,
}

/// Occupancy counters, mostly for logging and tests.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub buckets:   usize,
    pub movers:    usize,
    pub obstacles: usize,
}

// ── SpatialIndex ──────────────────────────────────────────────────────────────

/// Bucket grid answering "who/what is near this point".
///
/// Holds ids only; the stores in `nv-agent` own the records.  Every method
/// runs on the main step.
#[derive(Debug)]
pub struct SpatialIndex {
    bucket_size:      f32,
    buckets:          FxHashMap<BucketKey, Bucket>,
    movers:           FxHashMap<MoverId, IndexedMover>,
    obstacles:        FxHashMap<ObstacleId, IndexedObstacle>,
    /// Last neighbour-query region per mover, see [`Self::track_query_region`].
    query_regions:    FxHashMap<MoverId, BucketRange>,
    mover_version:    u64,
    obstacle_version: u64,
}

impl SpatialIndex {
    /// Create an empty index.  `bucket_size` must be finite and positive.
    pub fn new(bucket_size: f32) -> SpatialResult<Self> {
        if !(bucket_size.is_finite() && bucket_size > 0.0) {
            return Err(SpatialError::InvalidBucketSize(bucket_size));
        }
        debug!("spatial index created with bucket size {bucket_size}");
        Ok(Self {
            bucket_size,
            buckets:          FxHashMap::default(),
            movers:           FxHashMap::default(),
            obstacles:        FxHashMap::default(),
            query_regions:    FxHashMap::default(),
            mover_version:    0,
            obstacle_version: 0,
        })
    }

    #[inline]
    pub fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    #[inline]
    pub fn mover_version(&self) -> u64 {
        self.mover_version
    }

    #[inline]
    pub fn obstacle_version(&self) -> u64 {
        self.obstacle_version
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            buckets:   self.buckets.len(),
            movers:    self.movers.len(),
            obstacles: self.obstacles.len(),
        }
    }

    // ── Movers ────────────────────────────────────────────────────────────

    /// Register `mover` unconditionally and mark it `Indexed`.
    pub fn insert_mover(&mut self, mover: &mut Mover) {
        let range = BucketRange::of_sphere(mover.position, mover.radius(), self.bucket_size);
        let buckets = range.sphere_keys(mover.position, mover.radius(), self.bucket_size);
        self.register_mover(mover.id, mover.position, mover.radius(), range, buckets);
        mover.mark_indexed();
    }

    /// Bring `mover`'s membership up to date.  Returns `true` when it was
    /// (re-)registered, `false` when its buckets were already correct.
    pub fn update_mover(&mut self, mover: &mut Mover) -> bool {
        let (position, radius) = (mover.position, mover.radius());
        let range = BucketRange::of_sphere(position, radius, self.bucket_size);
        let mut fresh = None;
        if mover.index_state() == IndexState::Indexed {
            if let Some(entry) = self.movers.get_mut(&mover.id) {
                let mut unchanged = entry.range == range;
                if unchanged && !range.is_slab() {
                    let keys = range.sphere_keys(position, radius, self.bucket_size);
                    unchanged = keys == entry.buckets;
                    fresh = Some(keys);
                }
                if unchanged {
                    entry.position = position;
                    entry.radius = radius;
                    return false;
                }
            }
        }
        let buckets = fresh.unwrap_or_else(|| range.sphere_keys(position, radius, self.bucket_size));
        self.register_mover(mover.id, position, radius, range, buckets);
        mover.mark_indexed();
        true
    }

    /// Drop every reference to `id`.  The caller owns the `Mover` record and
    /// is expected to discard it (or call `mark_unindexed`) afterwards.
    pub fn remove_mover(&mut self, id: MoverId) -> SpatialResult<IndexedMover> {
        let entry = self.movers.remove(&id).ok_or(SpatialError::UnknownMover(id))?;
        self.unlink_mover(id, &entry.buckets);
        self.query_regions.remove(&id);
        self.mover_version += 1;
        Ok(entry)
    }

    #[inline]
    pub fn contains_mover(&self, id: MoverId) -> bool {
        self.movers.contains_key(&id)
    }

    #[inline]
    pub fn mover(&self, id: MoverId) -> Option<&IndexedMover> {
        self.movers.get(&id)
    }

    /// Buckets `id` is registered in.
    pub fn buckets_of(&self, id: MoverId) -> Option<&[BucketKey]> {
        self.movers.get(&id).map(|m| m.buckets.as_slice())
    }

    /// Movers registered in one bucket, ascending.
    pub fn bucket_movers(&self, key: BucketKey) -> Vec<MoverId> {
        let mut ids = self.buckets.get(&key).map(|b| b.movers.clone()).unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    fn register_mover(
        &mut self,
        id:       MoverId,
        position: Vec3,
        radius:   f32,
        range:    BucketRange,
        buckets:  Vec<BucketKey>,
    ) {
        let entry = IndexedMover { position, radius, range, buckets };
        match self.movers.insert(id, entry) {
            Some(old) if old.buckets == self.movers[&id].buckets => {
                // Explicit re-registration over the same buckets: membership
                // is unchanged, so the version stays put.
                return;
            }
            Some(old) => self.unlink_mover(id, &old.buckets),
            None => {}
        }
        for &key in &self.movers[&id].buckets {
            self.buckets.entry(key).or_default().movers.push(id);
        }
        self.mover_version += 1;
    }

    fn unlink_mover(&mut self, id: MoverId, keys: &[BucketKey]) {
        for &key in keys {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                if let Some(pos) = bucket.movers.iter().position(|&m| m == id) {
                    bucket.movers.swap_remove(pos);
                }
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    // ── Obstacles ─────────────────────────────────────────────────────────

    pub fn insert_obstacle(&mut self, obstacle: &Obstacle) {
        let range = BucketRange::covering(&obstacle.bounds, self.bucket_size);
        if let Some(old) = self.obstacles.insert(
            obstacle.id,
            IndexedObstacle { triangle: obstacle.triangle, range },
        ) {
            self.unlink_obstacle(obstacle.id, old.range);
        }
        for key in range.iter() {
            self.buckets.entry(key).or_default().obstacles.push(obstacle.id);
        }
        self.obstacle_version += 1;
    }

    /// Re-bucket an obstacle whose geometry changed.
    pub fn update_obstacle(&mut self, obstacle: &Obstacle) -> SpatialResult<()> {
        if !self.obstacles.contains_key(&obstacle.id) {
            return Err(SpatialError::UnknownObstacle(obstacle.id));
        }
        self.insert_obstacle(obstacle);
        Ok(())
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> SpatialResult<()> {
        let entry = self.obstacles.remove(&id).ok_or(SpatialError::UnknownObstacle(id))?;
        self.unlink_obstacle(id, entry.range);
        self.obstacle_version += 1;
        Ok(())
    }

    fn unlink_obstacle(&mut self, id: ObstacleId, range: BucketRange) {
        for key in range.iter() {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                if let Some(pos) = bucket.obstacles.iter().position(|&o| o == id) {
                    bucket.obstacles.swap_remove(pos);
                }
                if bucket.is_empty() {
                    self.buckets.remove(&key);
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Movers whose bounding sphere overlaps the sphere `(position, radius)`,
    /// ascending by id.
    pub fn query_neighbors(&self, position: Vec3, radius: f32) -> Vec<MoverId> {
        let mut ids = self.candidate_movers(position, radius);
        ids.retain(|id| {
            self.movers.get(id).is_some_and(|m| {
                let reach = radius + m.radius;
                m.position.distance_squared(position) <= reach * reach
            })
        });
        ids
    }

    /// Obstacles whose triangle comes within `radius` of `position`,
    /// ascending by id.
    pub fn query_obstacles(&self, position: Vec3, radius: f32) -> Vec<ObstacleId> {
        let mut ids = self.candidate_obstacles(position, radius);
        ids.retain(|id| {
            self.obstacles
                .get(id)
                .is_some_and(|o| o.triangle.distance_sq(position) <= radius * radius)
        });
        ids
    }

    /// Every mover sharing a bucket with the query sphere's box, ascending
    /// and deduplicated.  A superset of [`Self::query_neighbors`].
    pub fn candidate_movers(&self, position: Vec3, radius: f32) -> Vec<MoverId> {
        let range = BucketRange::of_sphere(position, radius, self.bucket_size);
        let mut ids = Vec::new();
        self.for_each_bucket(range, |b| ids.extend_from_slice(&b.movers));
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Obstacle counterpart of [`Self::candidate_movers`].
    pub fn candidate_obstacles(&self, position: Vec3, radius: f32) -> Vec<ObstacleId> {
        let range = BucketRange::of_sphere(position, radius, self.bucket_size);
        let mut ids = Vec::new();
        self.for_each_bucket(range, |b| ids.extend_from_slice(&b.obstacles));
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Record the bucket region a mover's neighbour query now covers.
    /// Returns `true` when it differs from the region recorded last time
    /// (or none was recorded), meaning cached candidates are stale.
    pub fn track_query_region(&mut self, id: MoverId, position: Vec3, radius: f32) -> bool {
        let range = BucketRange::of_sphere(position, radius, self.bucket_size);
        self.query_regions.insert(id, range) != Some(range)
    }

    fn for_each_bucket<'a>(&'a self, range: BucketRange, mut f: impl FnMut(&'a Bucket)) {
        // Sparse grids: scanning the occupied buckets is cheaper than probing
        // a query box that is mostly empty.
        if range.len() > self.buckets.len() {
            for (key, bucket) in &self.buckets {
                if range.contains(*key) {
                    f(bucket);
                }
            }
        } else {
            for key in range.iter() {
                if let Some(bucket) = self.buckets.get(&key) {
                    f(bucket);
                }
            }
        }
    }
}
