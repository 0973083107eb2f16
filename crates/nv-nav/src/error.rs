use thiserror::Error;

use nv_core::NavError;
use nv_mobility::MobilityError;
use nv_spatial::SpatialError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavContextError {
    #[error(transparent)]
    Nav(#[from] NavError),

    #[error("spatial index error: {0}")]
    Spatial(#[from] SpatialError),

    #[error("movement command rejected: {0}")]
    Mobility(#[from] MobilityError),

    #[error("step length must be finite and > 0, got {0}")]
    InvalidTimeStep(f32),
}

pub type NavContextResult<T> = Result<T, NavContextError>;
