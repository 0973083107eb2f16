//! Frozen obstacle geometry shared with worker threads.
//!
//! Built on the main step from the obstacle store, then handed out as
//! `Arc<ObstacleSnapshot>`.  A task keeps the snapshot it started with even
//! if a newer one is published meanwhile.

use rstar::{AABB, RTree, RTreeObject};

use nv_agent::ObstacleStore;
use nv_core::{Aabb, ObstacleId, Tick, Triangle};

#[derive(Clone, Debug)]
struct TriangleEntry {
    id:       ObstacleId,
    triangle: Triangle,
    envelope: AABB<[f32; 3]>,
}

impl RTreeObject for TriangleEntry {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn envelope_of(aabb: &Aabb) -> AABB<[f32; 3]> {
    AABB::from_corners(aabb.min.to_array(), aabb.max.to_array())
}

/// Read-only R-tree over obstacle triangles.
#[derive(Debug)]
pub struct ObstacleSnapshot {
    tree:     RTree<TriangleEntry>,
    /// Box around every triangle, `None` when empty.
    bounds:   Option<Aabb>,
    /// `ObstacleStore::version` at build time.
    version:  u64,
    built_at: Tick,
}

impl ObstacleSnapshot {
    pub fn empty() -> Self {
        Self { tree: RTree::new(), bounds: None, version: 0, built_at: Tick::ZERO }
    }

    /// Bulk-load a snapshot from arbitrary triangles.
    pub fn from_triangles<I>(triangles: I, version: u64, built_at: Tick) -> Self
    where
        I: IntoIterator<Item = (ObstacleId, Triangle)>,
    {
        let mut bounds: Option<Aabb> = None;
        let entries: Vec<TriangleEntry> = triangles
            .into_iter()
            .map(|(id, triangle)| {
                let aabb = triangle.aabb();
                bounds = Some(bounds.map_or(aabb, |b| b.union(aabb)));
                TriangleEntry { id, triangle, envelope: envelope_of(&aabb) }
            })
            .collect();
        Self { tree: RTree::bulk_load(entries), bounds, version, built_at }
    }

    pub fn from_store(store: &ObstacleStore, built_at: Tick) -> Self {
        Self::from_triangles(store.iter().map(|o| (o.id, o.triangle)), store.version(), built_at)
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn built_at(&self) -> Tick {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Box around all geometry in the snapshot.
    #[inline]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Triangles whose bounding box intersects `region`.
    pub fn triangles_in(&self, region: &Aabb) -> Vec<(ObstacleId, &Triangle)> {
        let envelope = envelope_of(region);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| (e.id, &e.triangle))
            .collect()
    }
}

impl Default for ObstacleSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
