//! The `Mover` record and its explicit invalidation state.
//!
//! # Invalidation rules
//!
//! Two independent pieces of derived state hang off a mover, and each has a
//! single owner that moves it between states:
//!
//! - [`IndexState`] — whether the spatial index membership is current.
//!   `Dirty` ⇒ the mover is re-registered unconditionally at the next index
//!   update, whatever its bucket range.  Set by [`Mover::request_reindex`]
//!   (radius change, teleport, flag change); cleared by the index.
//! - [`NeighborCache`] staleness — `movers_dirty` / `obstacles_dirty` mean
//!   the cached candidate id lists no longer reflect index membership.  Set
//!   during the index refresh phase only; cleared when the cache is refilled.

use nv_core::{MoverId, ObstacleId, Vec3};

/// Velocities shorter than this are treated as "not moving" when tracking
/// the last nonzero velocity.
const MOVING_EPSILON_SQ: f32 = 1e-8;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Behavioural flags of a mover.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoverFlags {
    /// The mover computes avoidance for itself.
    pub avoiding: bool,
    /// Other movers include this one as a neighbour.
    pub need_to_be_avoided: bool,
}

impl Default for MoverFlags {
    fn default() -> Self {
        Self { avoiding: true, need_to_be_avoided: true }
    }
}

/// Registration parameters for a new mover.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoverParams {
    pub radius: f32,
    pub max_speed: f32,
    /// Steering clamp in units/s².  `None` applies the solver's velocity
    /// immediately.
    pub max_acceleration: Option<f32>,
    /// Per-mover avoidance horizon; `None` uses the configured default.
    pub time_horizon: Option<f32>,
    /// Vertical extent, used by the planner as its height tolerance.
    pub height: f32,
    pub flags: MoverFlags,
}

impl Default for MoverParams {
    fn default() -> Self {
        Self {
            radius:           0.5,
            max_speed:        3.5,
            max_acceleration: None,
            time_horizon:     None,
            height:           2.0,
            flags:            MoverFlags::default(),
        }
    }
}

// ── Index & neighbour state ───────────────────────────────────────────────────

/// Spatial-index membership state of a mover.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexState {
    /// Not present in the index (freshly created).
    #[default]
    Unindexed,
    /// Present; bucket membership matches the last registered bounds.
    Indexed,
    /// Present, but must be re-registered at the next index update.
    Dirty,
}

/// Cached candidate neighbour ids plus their staleness flags.
#[derive(Clone, Debug, Default)]
pub struct NeighborCache {
    movers:          Vec<MoverId>,
    obstacles:       Vec<ObstacleId>,
    movers_dirty:    bool,
    obstacles_dirty: bool,
    mover_version:   Option<u64>,
    obstacle_version: Option<u64>,
}

impl NeighborCache {
    fn stale() -> Self {
        Self { movers_dirty: true, obstacles_dirty: true, ..Self::default() }
    }

    /// `NeighborMoversDirty`.
    #[inline]
    pub fn movers_dirty(&self) -> bool {
        self.movers_dirty
    }

    /// `NeighborObstaclesDirty`.
    #[inline]
    pub fn obstacles_dirty(&self) -> bool {
        self.obstacles_dirty
    }

    #[inline]
    pub fn movers(&self) -> &[MoverId] {
        &self.movers
    }

    #[inline]
    pub fn obstacles(&self) -> &[ObstacleId] {
        &self.obstacles
    }

    /// Index membership version the mover list was built against.
    #[inline]
    pub fn mover_version(&self) -> Option<u64> {
        self.mover_version
    }

    #[inline]
    pub fn obstacle_version(&self) -> Option<u64> {
        self.obstacle_version
    }

    pub fn mark_movers_stale(&mut self) {
        self.movers_dirty = true;
    }

    pub fn mark_obstacles_stale(&mut self) {
        self.obstacles_dirty = true;
    }

    /// Refill the mover list and clear `NeighborMoversDirty`.
    pub fn store_movers(&mut self, ids: Vec<MoverId>, version: u64) {
        self.movers = ids;
        self.mover_version = Some(version);
        self.movers_dirty = false;
    }

    /// Refill the obstacle list and clear `NeighborObstaclesDirty`.
    pub fn store_obstacles(&mut self, ids: Vec<ObstacleId>, version: u64) {
        self.obstacles = ids;
        self.obstacle_version = Some(version);
        self.obstacles_dirty = false;
    }
}

// ── Mover ─────────────────────────────────────────────────────────────────────

/// An entity that can steer around others and/or be steered around.
#[derive(Clone, Debug)]
pub struct Mover {
    pub id: MoverId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Last velocity with nonzero length; facing direction for idle movers.
    pub last_nonzero_velocity: Vec3,
    pub max_speed: f32,
    pub max_acceleration: Option<f32>,
    pub time_horizon: Option<f32>,
    pub height: f32,
    radius: f32,
    flags: MoverFlags,
    index_state: IndexState,
    neighbors: NeighborCache,
}

impl Mover {
    pub fn new(id: MoverId, position: Vec3, params: &MoverParams) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            last_nonzero_velocity: Vec3::ZERO,
            max_speed: params.max_speed.max(0.0),
            max_acceleration: params.max_acceleration,
            time_horizon: params.time_horizon,
            height: params.height,
            radius: params.radius.max(0.0),
            flags: params.flags,
            index_state: IndexState::Unindexed,
            neighbors: NeighborCache::stale(),
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn flags(&self) -> MoverFlags {
        self.flags
    }

    #[inline]
    pub fn index_state(&self) -> IndexState {
        self.index_state
    }

    #[inline]
    pub fn neighbors(&self) -> &NeighborCache {
        &self.neighbors
    }

    #[inline]
    pub fn neighbors_mut(&mut self) -> &mut NeighborCache {
        &mut self.neighbors
    }

    /// Effective avoidance horizon against movers.
    #[inline]
    pub fn tau(&self, default_tau: f32) -> f32 {
        self.time_horizon.unwrap_or(default_tau)
    }

    // ── Explicit transitions ──────────────────────────────────────────────

    /// Force re-registration at the next index update.  A mover that was
    /// never indexed stays `Unindexed` (it registers anyway).
    pub fn request_reindex(&mut self) {
        if self.index_state == IndexState::Indexed {
            self.index_state = IndexState::Dirty;
        }
        self.neighbors.mark_movers_stale();
        self.neighbors.mark_obstacles_stale();
    }

    /// Called by the spatial index once membership is current.
    pub fn mark_indexed(&mut self) {
        self.index_state = IndexState::Indexed;
    }

    /// Called by the spatial index after removal.
    pub fn mark_unindexed(&mut self) {
        self.index_state = IndexState::Unindexed;
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
        self.request_reindex();
    }

    pub fn set_flags(&mut self, flags: MoverFlags) {
        if flags != self.flags {
            self.flags = flags;
            self.request_reindex();
        }
    }

    /// Move instantly, bypassing integration.
    pub fn teleport(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.request_reindex();
    }

    /// Integrate one step at velocity `v`.
    pub fn integrate(&mut self, v: Vec3, dt: f32) {
        self.velocity = v;
        if v.length_squared() > MOVING_EPSILON_SQ {
            self.last_nonzero_velocity = v;
        }
        self.position += v * dt;
    }
}
