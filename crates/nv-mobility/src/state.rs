//! Per-mover movement state.

use nv_core::{MoverId, Vec3};
use nv_pathfind::Path;

/// What the mover was last told to do.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveGoal {
    /// Reach one point via a planned path.
    Point(Vec3),
    /// Walk the given points in order, optionally forever.  Each leg is
    /// planned separately.
    Points { points: Vec<Vec3>, looping: bool },
    /// Chase another mover, re-planning as it moves.
    Follow {
        target:         MoverId,
        reach_distance: f32,
        /// Keep following after the first contact instead of finishing.
        continuous:     bool,
    },
}

/// The controller's state.
///
/// `Seeking` with `path: None` means a path request is in flight (or, when
/// following, that the mover steers straight at its target).
#[derive(Clone, Debug, PartialEq, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Seeking {
        path:     Option<Path>,
        /// Index of the waypoint currently steered at.
        waypoint: usize,
    },
    Arrived,
}

impl MovementState {
    #[inline]
    pub fn is_idle(&self) -> bool {
        matches!(self, MovementState::Idle)
    }

    #[inline]
    pub fn is_seeking(&self) -> bool {
        matches!(self, MovementState::Seeking { .. })
    }

    #[inline]
    pub fn is_arrived(&self) -> bool {
        matches!(self, MovementState::Arrived)
    }

    /// The waypoint currently steered at, if a path is loaded.
    pub fn current_waypoint(&self) -> Option<Vec3> {
        match self {
            MovementState::Seeking { path: Some(path), waypoint } => path.get(*waypoint),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            MovementState::Seeking { path, .. } => path.as_ref(),
            _ => None,
        }
    }
}
