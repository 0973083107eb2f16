//! Pathfinding error type.
//!
//! Failures travel back to the requester through the result queue as values;
//! nothing here is ever raised on the main step.

use std::fmt;

use thiserror::Error;

/// Why a path request did not produce a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathErrorKind {
    /// No route exists between start and goal.
    Unreachable,
    /// The search exceeded its time or expansion budget.  Retrying may help.
    TimedOut,
    /// The requester went away or cancelled before the result arrived.
    /// Never delivered; results of this kind are dropped.
    StaleRequest,
    /// The planner panicked on its worker thread.
    Internal,
}

impl fmt::Display for PathErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unreachable  => "unreachable",
            Self::TimedOut     => "timed out",
            Self::StaleRequest => "stale request",
            Self::Internal     => "internal error",
        };
        f.write_str(name)
    }
}

/// Tagged reason plus a human-readable message.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct PathfindingError {
    pub kind:    PathErrorKind,
    pub message: String,
}

impl PathfindingError {
    pub fn new(kind: PathErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(PathErrorKind::Unreachable, message)
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(PathErrorKind::TimedOut, message)
    }

    pub fn stale(message: impl Into<String>) -> Self {
        Self::new(PathErrorKind::StaleRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(PathErrorKind::Internal, message)
    }
}

pub type PathResult<T> = Result<T, PathfindingError>;
