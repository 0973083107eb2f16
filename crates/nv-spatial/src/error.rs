//! Spatial-index error type.

use thiserror::Error;

use nv_core::{MoverId, NavError, ObstacleId};

/// Errors produced by `nv-spatial`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpatialError {
    #[error("bucket size must be finite and > 0, got {0}")]
    InvalidBucketSize(f32),

    #[error("mover {0} is not in the spatial index")]
    UnknownMover(MoverId),

    #[error("obstacle {0} is not in the spatial index")]
    UnknownObstacle(ObstacleId),
}

impl From<SpatialError> for NavError {
    fn from(e: SpatialError) -> Self {
        match e {
            SpatialError::InvalidBucketSize(_) => NavError::InvalidConfiguration(e.to_string()),
            SpatialError::UnknownMover(id)      => NavError::MoverNotFound(id),
            SpatialError::UnknownObstacle(id)   => NavError::ObstacleNotFound(id),
        }
    }
}

pub type SpatialResult<T> = Result<T, SpatialError>;
