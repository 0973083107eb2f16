//! Per-mover movement controller: path following and target seeking.

use log::debug;

use nv_agent::MoverStore;
use nv_core::{MoverId, NavConfig, TaskHandle, Vec3};
use nv_pathfind::{Path, PathConstraints, PathRequest, PathResult, PathService};

use crate::{MobilityError, MobilityResult, MoveGoal, MovementState, NavEvent};

/// Steering toward a point closer than this yields a zero velocity.
const ARRIVAL_EPSILON: f32 = 1e-6;

// ── Collaborator seams ────────────────────────────────────────────────────────

/// Resolves the live position of a followed mover.
pub trait TargetLookup {
    /// `None` once the mover has been unregistered.
    fn position_of(&self, id: MoverId) -> Option<Vec3>;
}

impl TargetLookup for MoverStore {
    fn position_of(&self, id: MoverId) -> Option<Vec3> {
        self.get(id).map(|m| m.position)
    }
}

/// Distances that drive waypoint and target transitions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SteerTuning {
    /// A waypoint closer than this counts as reached.
    pub reach_threshold: f32,
    /// A followed target this far from the end of the planned path triggers
    /// a new request.
    pub repath_distance: f32,
}

impl SteerTuning {
    pub fn from_config(config: &NavConfig) -> Self {
        Self {
            reach_threshold: config.waypoint_reach_threshold,
            repath_distance: config.repath_distance,
        }
    }
}

impl Default for SteerTuning {
    fn default() -> Self {
        Self::from_config(&NavConfig::default())
    }
}

/// What the controller needs to know about its mover for one step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SteerInput {
    pub position:    Vec3,
    pub max_speed:   f32,
    /// Used when the controller plans on its own (route legs, follow mode).
    pub constraints: PathConstraints,
    pub dt:          f32,
}

// ── MovementController ────────────────────────────────────────────────────────

/// Drives one mover through `Idle → Seeking → Arrived`.
///
/// The controller never touches the mover record; it reads a [`SteerInput`]
/// and returns a desired velocity, which the caller feeds to the avoidance
/// solver.  At most one path request is in flight per controller: every new
/// command cancels the previous one first, and results for any handle other
/// than the current one are rejected by [`on_path_result`](Self::on_path_result).
#[derive(Clone, Debug)]
pub struct MovementController {
    mover:        MoverId,
    tuning:       SteerTuning,
    state:        MovementState,
    goal:         Option<MoveGoal>,
    pending:      Option<TaskHandle>,
    /// Goal of the most recent request; follow mode re-plans when the
    /// target drifts away from it.
    planned_goal: Option<Vec3>,
    /// Route point the current leg of a `Points` goal leads to.
    leg:          usize,
    in_reach:     bool,
}

impl MovementController {
    pub fn new(mover: MoverId, tuning: SteerTuning) -> Self {
        Self {
            mover,
            tuning,
            state:        MovementState::Idle,
            goal:         None,
            pending:      None,
            planned_goal: None,
            leg:          0,
            in_reach:     false,
        }
    }

    #[inline]
    pub fn mover(&self) -> MoverId {
        self.mover
    }

    #[inline]
    pub fn state(&self) -> &MovementState {
        &self.state
    }

    #[inline]
    pub fn goal(&self) -> Option<&MoveGoal> {
        self.goal.as_ref()
    }

    /// Handle of the in-flight path request, if any.
    #[inline]
    pub fn pending(&self) -> Option<TaskHandle> {
        self.pending
    }

    #[inline]
    pub fn tuning(&self) -> SteerTuning {
        self.tuning
    }

    // ── Commands ──────────────────────────────────────────────────────────

    /// Plan a path from `start` to `target` and walk it once delivered.
    pub fn move_to<S: PathService + ?Sized>(
        &mut self,
        start:       Vec3,
        target:      Vec3,
        constraints: PathConstraints,
        paths:       &mut S,
    ) {
        self.reset(paths);
        self.goal  = Some(MoveGoal::Point(target));
        self.state = MovementState::Seeking { path: None, waypoint: 0 };
        self.request(start, target, constraints, paths);
    }

    /// Walk `points` in order, wrapping to the first one when `looping`.
    ///
    /// Every leg is planned on its own: the controller requests a path to
    /// the next point, walks it, reports the point as passed and only then
    /// requests the following leg.  A failed leg ends the route.
    pub fn move_to_points<S: PathService + ?Sized>(
        &mut self,
        start:       Vec3,
        points:      Vec<Vec3>,
        looping:     bool,
        constraints: PathConstraints,
        paths:       &mut S,
    ) -> MobilityResult<()> {
        let Some(&first) = points.first() else {
            return Err(MobilityError::EmptyWaypoints(self.mover));
        };
        self.reset(paths);
        self.goal  = Some(MoveGoal::Points { points, looping });
        self.state = MovementState::Seeking { path: None, waypoint: 0 };
        self.request(start, first, constraints, paths);
        Ok(())
    }

    /// Index of the route point the current leg leads to.
    #[inline]
    pub fn leg(&self) -> usize {
        self.leg
    }

    /// Chase `target`, currently at `target_position`.
    ///
    /// With `continuous == false` the controller finishes on first contact;
    /// otherwise it keeps following and re-plans as the target moves.
    #[allow(clippy::too_many_arguments)]
    pub fn follow<S: PathService + ?Sized>(
        &mut self,
        start:           Vec3,
        target:          MoverId,
        target_position: Vec3,
        reach_distance:  f32,
        continuous:      bool,
        constraints:     PathConstraints,
        paths:           &mut S,
    ) -> MobilityResult<()> {
        if !(reach_distance.is_finite() && reach_distance > 0.0) {
            return Err(MobilityError::InvalidReachDistance(reach_distance));
        }
        if target == self.mover {
            return Err(MobilityError::CannotFollowSelf(self.mover));
        }
        self.reset(paths);
        self.goal  = Some(MoveGoal::Follow { target, reach_distance, continuous });
        self.state = MovementState::Seeking { path: None, waypoint: 0 };
        self.request(start, target_position, constraints, paths);
        Ok(())
    }

    /// Drop the current goal and cancel any in-flight request.
    pub fn stop<S: PathService + ?Sized>(&mut self, paths: &mut S) {
        self.reset(paths);
    }

    // ── Path delivery ─────────────────────────────────────────────────────

    /// Route a completed request to this controller.
    ///
    /// Returns `false` (and changes nothing) when `handle` is not the
    /// request this controller is waiting for.
    pub fn on_path_result(
        &mut self,
        handle: TaskHandle,
        result: PathResult<Path>,
        events: &mut Vec<NavEvent>,
    ) -> bool {
        if self.pending != Some(handle) {
            debug!("{}: ignoring result for superseded {handle}", self.mover);
            return false;
        }
        self.pending = None;

        match result {
            Ok(path) if path.is_empty() => {
                // Already standing on the goal.
                match &self.goal {
                    Some(MoveGoal::Follow { .. }) => {
                        self.state = MovementState::Seeking { path: None, waypoint: 0 };
                    }
                    Some(MoveGoal::Points { points, .. }) => {
                        // Finish the leg on the next update.
                        let path = Path::new(points.get(self.leg).into_iter().copied().collect());
                        self.state = MovementState::Seeking { path: Some(path), waypoint: 0 };
                    }
                    _ => {
                        self.state = MovementState::Arrived;
                        events.push(NavEvent::Finished { mover: self.mover });
                    }
                }
            }
            Ok(path) => {
                events.push(NavEvent::PathUpdated { mover: self.mover, path: path.clone() });
                self.state = MovementState::Seeking { path: Some(path), waypoint: 0 };
            }
            Err(error) => {
                debug!("{}: pathfinding failed: {error}", self.mover);
                self.goal         = None;
                self.planned_goal = None;
                self.state        = MovementState::Idle;
                events.push(NavEvent::PathfindingFailed { mover: self.mover, error });
            }
        }
        true
    }

    // ── Per-step update ───────────────────────────────────────────────────

    /// Advance the state machine and return this step's desired velocity.
    pub fn update<T, S>(
        &mut self,
        input:   &SteerInput,
        targets: &T,
        paths:   &mut S,
        events:  &mut Vec<NavEvent>,
    ) -> Vec3
    where
        T: TargetLookup + ?Sized,
        S: PathService + ?Sized,
    {
        if !self.state.is_seeking() {
            return Vec3::ZERO;
        }
        match self.goal.as_ref() {
            Some(MoveGoal::Point(_)) => self.follow_path(input, events),
            Some(MoveGoal::Points { .. }) => self.follow_route(input, paths, events),
            Some(&MoveGoal::Follow { target, reach_distance, continuous }) => {
                self.chase(input, target, reach_distance, continuous, targets, paths, events)
            }
            None => Vec3::ZERO,
        }
    }

    fn follow_path(&mut self, input: &SteerInput, events: &mut Vec<NavEvent>) -> Vec3 {
        let mover = self.mover;
        let threshold = self.tuning.reach_threshold;
        let MovementState::Seeking { path: Some(path), waypoint } = &mut self.state else {
            // Still waiting for the planner.
            return Vec3::ZERO;
        };

        while let Some(point) = path.get(*waypoint) {
            if input.position.distance(point) > threshold {
                return steer(input, point);
            }
            if *waypoint + 1 == path.len() {
                break;
            }
            events.push(NavEvent::WaypointPassed { mover, index: *waypoint, point });
            *waypoint += 1;
        }

        self.state = MovementState::Arrived;
        events.push(NavEvent::Finished { mover });
        Vec3::ZERO
    }

    /// Walk the current leg; at its end, report the route point and request
    /// the next leg.  Planner waypoints inside a leg pass silently.
    fn follow_route<S: PathService + ?Sized>(
        &mut self,
        input:  &SteerInput,
        paths:  &mut S,
        events: &mut Vec<NavEvent>,
    ) -> Vec3 {
        let mover = self.mover;
        let threshold = self.tuning.reach_threshold;
        let MovementState::Seeking { path: Some(path), waypoint } = &mut self.state else {
            return Vec3::ZERO;
        };
        while let Some(point) = path.get(*waypoint) {
            if input.position.distance(point) > threshold {
                return steer(input, point);
            }
            *waypoint += 1;
        }

        let Some(MoveGoal::Points { points, looping }) = &self.goal else {
            return Vec3::ZERO;
        };
        let leg = self.leg;
        let Some(&point) = points.get(leg) else {
            return Vec3::ZERO;
        };
        let last = leg + 1 == points.len();
        if last && !*looping {
            self.state = MovementState::Arrived;
            events.push(NavEvent::Finished { mover });
            return Vec3::ZERO;
        }
        let next_leg = if last { 0 } else { leg + 1 };
        let next = points[next_leg];

        events.push(NavEvent::WaypointPassed { mover, index: leg, point });
        self.leg   = next_leg;
        self.state = MovementState::Seeking { path: None, waypoint: 0 };
        self.request(input.position, next, input.constraints, paths);
        Vec3::ZERO
    }

    #[allow(clippy::too_many_arguments)]
    fn chase<T, S>(
        &mut self,
        input:          &SteerInput,
        target:         MoverId,
        reach_distance: f32,
        continuous:     bool,
        targets:        &T,
        paths:          &mut S,
        events:         &mut Vec<NavEvent>,
    ) -> Vec3
    where
        T: TargetLookup + ?Sized,
        S: PathService + ?Sized,
    {
        let mover = self.mover;
        let Some(target_position) = targets.position_of(target) else {
            debug!("{mover}: follow target {target} is gone");
            self.reset(paths);
            events.push(NavEvent::TargetLost { mover, target });
            return Vec3::ZERO;
        };

        if input.position.distance(target_position) <= reach_distance {
            if !self.in_reach {
                self.in_reach = true;
                events.push(NavEvent::TargetReached { mover, target });
                if !continuous {
                    self.cancel_pending(paths);
                    self.state = MovementState::Arrived;
                    events.push(NavEvent::Finished { mover });
                }
            }
            return Vec3::ZERO;
        }
        self.in_reach = false;

        let drifted = self
            .planned_goal
            .is_none_or(|goal| goal.distance(target_position) > self.tuning.repath_distance);
        if drifted && self.pending.is_none() {
            debug!("{mover}: re-planning toward {target}");
            self.request(input.position, target_position, input.constraints, paths);
        }

        let threshold = self.tuning.reach_threshold;
        if let MovementState::Seeking { path: Some(path), waypoint } = &mut self.state {
            while let Some(point) = path.get(*waypoint) {
                if input.position.distance(point) > threshold {
                    return steer(input, point);
                }
                events.push(NavEvent::WaypointPassed { mover, index: *waypoint, point });
                *waypoint += 1;
            }
        }
        // No path yet, or it ran out: head straight for the target.
        steer(input, target_position)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn request<S: PathService + ?Sized>(
        &mut self,
        start:       Vec3,
        goal:        Vec3,
        constraints: PathConstraints,
        paths:       &mut S,
    ) {
        let handle = paths.submit(PathRequest::new(self.mover, start, goal, constraints));
        debug!("{}: submitted {handle}", self.mover);
        self.pending      = Some(handle);
        self.planned_goal = Some(goal);
    }

    fn cancel_pending<S: PathService + ?Sized>(&mut self, paths: &mut S) {
        if let Some(handle) = self.pending.take() {
            paths.cancel(handle);
        }
    }

    fn reset<S: PathService + ?Sized>(&mut self, paths: &mut S) {
        self.cancel_pending(paths);
        self.goal         = None;
        self.planned_goal = None;
        self.leg          = 0;
        self.in_reach     = false;
        self.state        = MovementState::Idle;
    }
}

/// Velocity toward `point`, slowing so the step does not overshoot it.
fn steer(input: &SteerInput, point: Vec3) -> Vec3 {
    let offset = point - input.position;
    let distance = offset.length();
    if distance <= ARRIVAL_EPSILON {
        return Vec3::ZERO;
    }
    let mut speed = input.max_speed.max(0.0);
    if input.dt > 0.0 {
        speed = speed.min(distance / input.dt);
    }
    offset / distance * speed
}
