//! Observer trait for navigation events and per-step statistics.

use nv_agent::MoverStore;
use nv_core::{MoverId, Tick, Vec3};
use nv_mobility::NavEvent;
use nv_pathfind::{Path, PathfindingError};

/// Counters for one call to [`NavContext::step`][crate::NavContext::step].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NavStepStats {
    pub tick:                   Tick,
    /// Movers whose position changed.
    pub moved:                  usize,
    /// Movers re-registered in the spatial index.
    pub reindexed:              usize,
    /// Avoidance solves that fell back to the least-violating velocity.
    pub avoidance_approximated: usize,
    pub paths_delivered:        usize,
    /// Results whose requester is gone or no longer waiting for them.
    pub paths_dropped:          usize,
}

/// Callbacks invoked by [`NavContext::step`][crate::NavContext::step].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  Events are delivered at the end of the
/// step in the order the controllers emitted them, through
/// [`on_event`](Self::on_event), whose default implementation fans out to
/// the typed callbacks.
///
/// # Example: arrival logger
///
/// ```rust,ignore
/// struct Arrivals(Vec<MoverId>);
///
/// impl NavObserver for Arrivals {
///     fn on_finished(&mut self, mover: MoverId) {
///         self.0.push(mover);
///     }
/// }
/// ```
pub trait NavObserver {
    /// Every event passes through here first.
    fn on_event(&mut self, event: &NavEvent) {
        match event {
            NavEvent::Initialized => self.on_initialized(),
            NavEvent::PathUpdated { mover, path } => self.on_path_updated(*mover, path),
            NavEvent::WaypointPassed { mover, index, point } => {
                self.on_waypoint_passed(*mover, *index, *point)
            }
            NavEvent::Finished { mover } => self.on_finished(*mover),
            NavEvent::PathfindingFailed { mover, error } => self.on_pathfinding_failed(*mover, error),
            NavEvent::TargetReached { mover, target } => self.on_target_reached(*mover, *target),
            NavEvent::TargetLost { mover, target } => self.on_target_lost(*mover, *target),
        }
    }

    /// The context ran its first step.
    fn on_initialized(&mut self) {}

    fn on_path_updated(&mut self, _mover: MoverId, _path: &Path) {}

    fn on_waypoint_passed(&mut self, _mover: MoverId, _index: usize, _point: Vec3) {}

    fn on_finished(&mut self, _mover: MoverId) {}

    fn on_pathfinding_failed(&mut self, _mover: MoverId, _error: &PathfindingError) {}

    fn on_target_reached(&mut self, _mover: MoverId, _target: MoverId) {}

    fn on_target_lost(&mut self, _mover: MoverId, _target: MoverId) {}

    /// Called once per step after all events, with read-only access to every
    /// mover so output writers can record positions.
    fn on_step_end(&mut self, _stats: &NavStepStats, _movers: &MoverStore) {}
}

/// A [`NavObserver`] that does nothing.
pub struct NoopObserver;

impl NavObserver for NoopObserver {}
