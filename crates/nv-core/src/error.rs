//! Framework error type.
//!
//! Sub-crates define their own error enums and convert them into
//! `NavError` where they cross into the composition root, or wrap it as one
//! variant.  Configuration problems are always reported through
//! [`NavError::InvalidConfiguration`] and are fatal at start-up.

use thiserror::Error;

use crate::{MoverId, ObstacleId};

/// The top-level error type for `nv-core` and a common base for sub-crates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("mover {0} not found")]
    MoverNotFound(MoverId),

    #[error("mover {0} is already registered")]
    DuplicateMover(MoverId),

    #[error("obstacle {0} not found")]
    ObstacleNotFound(ObstacleId),
}

/// Shorthand result type for all `nv-*` crates.
pub type NavResult<T> = Result<T, NavError>;
