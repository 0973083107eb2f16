//! Movement-command error type.
//!
//! Only command validation fails synchronously.  Path failures are reported
//! asynchronously as [`NavEvent::PathfindingFailed`](crate::NavEvent).

use thiserror::Error;

use nv_core::MoverId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MobilityError {
    #[error("mover {0} not found")]
    UnknownMover(MoverId),

    #[error("mover {0} was given an empty waypoint list")]
    EmptyWaypoints(MoverId),

    #[error("reach distance must be finite and > 0, got {0}")]
    InvalidReachDistance(f32),

    #[error("mover {0} cannot follow itself")]
    CannotFollowSelf(MoverId),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
