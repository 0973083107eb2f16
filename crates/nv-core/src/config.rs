//! Global navigation tunables.
//!
//! Loaded (or constructed) by the host application and handed to the
//! navigation context builder, which rejects invalid values before anything
//! else is created.

use std::time::Duration;

use crate::{NavError, NavResult};

/// Top-level navigation configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavConfig {
    /// Edge length of one spatial-index bucket, world units.  Must be > 0.
    pub bucket_size: f32,

    /// Maximum number of pathfinding tasks executing at once.  Must be >= 1.
    /// Default: the machine's available parallelism.
    pub max_concurrent_tasks: usize,

    /// Default avoidance time horizon (`tau`) against other movers, seconds.
    pub default_time_horizon: f32,

    /// Avoidance time horizon against obstacle triangles, seconds.
    pub obstacle_time_horizon: f32,

    /// Extra radius added around obstacle geometry when avoiding it.
    pub obstacle_danger_distance: f32,

    /// Radius around a mover in which other movers and obstacles are
    /// considered by the solver.
    pub neighbor_distance: f32,

    /// Cap on mover neighbours folded into one solve (nearest first).
    pub max_neighbors: usize,

    /// Distance at which a waypoint counts as reached.
    pub waypoint_reach_threshold: f32,

    /// Wall-clock budget for a single path computation.
    pub path_time_budget: Duration,

    /// Minimum number of steps between two planner snapshot rebuilds.
    pub snapshot_refresh_interval: u64,

    /// How far a followed target may drift from the end of the current path
    /// before the path is considered stale and re-requested.
    pub repath_distance: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            bucket_size:               4.0,
            max_concurrent_tasks:      default_parallelism(),
            default_time_horizon:      2.0,
            obstacle_time_horizon:     1.0,
            obstacle_danger_distance:  0.1,
            neighbor_distance:         10.0,
            max_neighbors:             10,
            waypoint_reach_threshold:  0.1,
            path_time_budget:          Duration::from_millis(50),
            snapshot_refresh_interval: 30,
            repath_distance:           1.0,
        }
    }
}

impl NavConfig {
    /// Check every tunable; the first offending field is named in the error.
    pub fn validate(&self) -> NavResult<()> {
        positive("bucket_size", self.bucket_size)?;
        if self.max_concurrent_tasks == 0 {
            return Err(invalid("max_concurrent_tasks must be at least 1"));
        }
        positive("default_time_horizon", self.default_time_horizon)?;
        positive("obstacle_time_horizon", self.obstacle_time_horizon)?;
        if !(self.obstacle_danger_distance.is_finite() && self.obstacle_danger_distance >= 0.0) {
            return Err(invalid(format!(
                "obstacle_danger_distance must be finite and >= 0, got {}",
                self.obstacle_danger_distance
            )));
        }
        positive("neighbor_distance", self.neighbor_distance)?;
        if self.max_neighbors == 0 {
            return Err(invalid("max_neighbors must be at least 1"));
        }
        positive("waypoint_reach_threshold", self.waypoint_reach_threshold)?;
        if self.path_time_budget.is_zero() {
            return Err(invalid("path_time_budget must be non-zero"));
        }
        if self.snapshot_refresh_interval == 0 {
            return Err(invalid("snapshot_refresh_interval must be at least 1"));
        }
        positive("repath_distance", self.repath_distance)?;
        Ok(())
    }
}

/// Hardware parallelism, falling back to a single worker when unknown.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn positive(name: &str, value: f32) -> NavResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and > 0, got {value}")))
    }
}

fn invalid(msg: impl Into<String>) -> NavError {
    NavError::InvalidConfiguration(msg.into())
}
