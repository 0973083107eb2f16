//! Path requests and delivered paths.

use std::time::Duration;

use nv_core::{MoverId, Vec3};

/// Per-request limits and agent dimensions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathConstraints {
    /// Clearance kept from obstacle geometry.
    pub agent_radius: f32,
    /// Vertical extent; geometry above `base + agent_height` is ignored.
    pub agent_height: f32,
    /// Wall-clock budget.  `None` uses the scheduler's default.
    pub time_budget:  Option<Duration>,
}

impl Default for PathConstraints {
    fn default() -> Self {
        Self { agent_radius: 0.5, agent_height: 2.0, time_budget: None }
    }
}

/// One unit of work for the scheduler.  Captured by value at submission.
#[derive(Clone, Debug, PartialEq)]
pub struct PathRequest {
    pub start:       Vec3,
    pub goal:        Vec3,
    pub requester:   MoverId,
    pub constraints: PathConstraints,
}

impl PathRequest {
    pub fn new(requester: MoverId, start: Vec3, goal: Vec3, constraints: PathConstraints) -> Self {
        Self { start, goal, requester, constraints }
    }
}

/// Ordered waypoints from (but excluding) the start to the goal.
///
/// Immutable once built; consumers track their own progress index.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    waypoints: Vec<Vec3>,
}

impl Path {
    pub fn new(waypoints: Vec<Vec3>) -> Self {
        Self { waypoints }
    }

    #[inline]
    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.waypoints.get(index).copied()
    }

    #[inline]
    pub fn last(&self) -> Option<Vec3> {
        self.waypoints.last().copied()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Polyline length from `from` through every waypoint.
    pub fn length_from(&self, from: Vec3) -> f32 {
        let mut prev = from;
        let mut total = 0.0;
        for &w in &self.waypoints {
            total += prev.distance(w);
            prev = w;
        }
        total
    }
}
