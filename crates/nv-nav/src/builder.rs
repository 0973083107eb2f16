//! Fluent builder for constructing a [`NavContext`].

use std::sync::Arc;

use log::info;

use nv_agent::{MoverStore, ObstacleStore};
use nv_avoidance::AvoidanceSolver;
use nv_core::{NavConfig, StepClock, Tick, Triangle};
use nv_pathfind::{GridPlanner, ObstacleSnapshot, PathPlanner, PathScheduler};
use nv_spatial::SpatialIndex;

use crate::{NavContext, NavContextResult};

/// Fluent builder for [`NavContext<P>`].
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                 |
/// |-------------------|-------------------------|
/// | `.planner(p)`     | `GridPlanner::default()`|
/// | `.obstacles(it)`  | no geometry             |
///
/// # Example
///
/// ```rust,ignore
/// let nav = NavContextBuilder::new(config)
///     .obstacles(level_triangles)
///     .build()?;
/// ```
pub struct NavContextBuilder<P: PathPlanner + 'static = GridPlanner> {
    config:    NavConfig,
    planner:   P,
    triangles: Vec<Triangle>,
}

impl NavContextBuilder<GridPlanner> {
    pub fn new(config: NavConfig) -> Self {
        Self { config, planner: GridPlanner::default(), triangles: Vec::new() }
    }
}

impl<P: PathPlanner + 'static> NavContextBuilder<P> {
    /// Swap the pathfinding primitive.
    pub fn planner<Q: PathPlanner + 'static>(self, planner: Q) -> NavContextBuilder<Q> {
        NavContextBuilder { config: self.config, planner, triangles: self.triangles }
    }

    /// Initial obstacle geometry, registered before the first step and
    /// visible to the very first path request.
    pub fn obstacles<I: IntoIterator<Item = Triangle>>(mut self, triangles: I) -> Self {
        self.triangles.extend(triangles);
        self
    }

    /// Validate the configuration and create every subsystem.
    ///
    /// An invalid [`NavConfig`] is fatal here; nothing is spawned.
    pub fn build(self) -> NavContextResult<NavContext<P>> {
        self.config.validate()?;

        let mut index = SpatialIndex::new(self.config.bucket_size)?;
        let mut obstacles = ObstacleStore::new();
        for triangle in self.triangles {
            let id = obstacles.insert(triangle, Tick::ZERO);
            if let Some(obstacle) = obstacles.get(id) {
                index.insert_obstacle(obstacle);
            }
        }

        let mut scheduler = PathScheduler::from_config(self.planner, &self.config)?;
        scheduler.set_snapshot(Arc::new(ObstacleSnapshot::from_store(&obstacles, Tick::ZERO)));

        info!(
            "navigation context ready: bucket {} m, {} path workers, {} obstacles",
            self.config.bucket_size,
            scheduler.max_concurrent(),
            obstacles.len()
        );

        Ok(NavContext {
            solver: AvoidanceSolver::from_config(&self.config),
            config: self.config,
            clock: StepClock::new(),
            movers: MoverStore::new(),
            obstacles,
            index,
            scheduler,
            controllers: Default::default(),
            events: Vec::new(),
            initialized: false,
            snapshot_age: 0,
        })
    }
}
