//! Obstacle triangle records.

use nv_core::{Aabb, ObstacleId, Tick, Triangle};

/// A static or semi-static piece of world geometry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Obstacle {
    pub id: ObstacleId,
    pub triangle: Triangle,
    /// Cached `triangle.aabb()`.
    pub bounds: Aabb,
    /// Step at which the geometry was last set.
    pub last_update: Tick,
}

impl Obstacle {
    pub fn new(id: ObstacleId, triangle: Triangle, now: Tick) -> Self {
        Self { id, triangle, bounds: triangle.aabb(), last_update: now }
    }
}
