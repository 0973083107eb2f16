//! Outbound navigation events.

use nv_core::{MoverId, Vec3};
use nv_pathfind::{Path, PathfindingError};

/// One notification, emitted at a state-machine transition and dispatched
/// to the observer at the end of the step in emission order.
#[derive(Clone, Debug, PartialEq)]
pub enum NavEvent {
    /// The navigation context ran its first step.
    Initialized,
    /// A new waypoint sequence replaced the previous one.
    PathUpdated { mover: MoverId, path: Path },
    /// Waypoint `index` was reached and is no longer the current target.
    WaypointPassed { mover: MoverId, index: usize, point: Vec3 },
    /// The last waypoint was reached (or a one-shot follow reached its target).
    Finished { mover: MoverId },
    /// The path request failed; the mover is `Idle` again.
    PathfindingFailed { mover: MoverId, error: PathfindingError },
    /// A followed target came within reach.
    TargetReached { mover: MoverId, target: MoverId },
    /// A followed target was unregistered; the mover is `Idle` again.
    TargetLost { mover: MoverId, target: MoverId },
}

impl NavEvent {
    /// The mover the event concerns, if any.
    pub fn mover(&self) -> Option<MoverId> {
        match self {
            NavEvent::Initialized => None,
            NavEvent::PathUpdated { mover, .. }
            | NavEvent::WaypointPassed { mover, .. }
            | NavEvent::Finished { mover }
            | NavEvent::PathfindingFailed { mover, .. }
            | NavEvent::TargetReached { mover, .. }
            | NavEvent::TargetLost { mover, .. } => Some(*mover),
        }
    }

    /// Short stable name, used as the `kind` column of event logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NavEvent::Initialized            => "initialized",
            NavEvent::PathUpdated { .. }     => "path_updated",
            NavEvent::WaypointPassed { .. }  => "waypoint_passed",
            NavEvent::Finished { .. }        => "finished",
            NavEvent::PathfindingFailed { .. } => "pathfinding_failed",
            NavEvent::TargetReached { .. }   => "target_reached",
            NavEvent::TargetLost { .. }      => "target_lost",
        }
    }
}
