//! The `NavContext` struct and its per-step update.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use nv_agent::{Mover, MoverFlags, MoverParams, MoverStore, ObstacleStore};
use nv_avoidance::{AgentSnapshot, AvoidanceSolver, Neighbor, ObstacleSample, SolveOutcome};
use nv_core::geom::FLOOR_CLEARANCE;
use nv_core::{MoverId, NavConfig, NavError, ObstacleId, StepClock, Tick, Triangle, Vec3};
use nv_mobility::{MovementController, MovementState, NavEvent, SteerInput, SteerTuning};
use nv_pathfind::{GridPlanner, ObstacleSnapshot, PathConstraints, PathPlanner, PathScheduler};
use nv_spatial::SpatialIndex;

use crate::{NavContextError, NavContextResult, NavObserver, NavStepStats};

/// Owns every mover, obstacle and subsystem, and drives them one step at a
/// time.
///
/// Everything except path planning runs on the thread that calls
/// [`step`](Self::step).  Dropping the context shuts the scheduler down:
/// queued requests are discarded and running ones finish unobserved.
///
/// Create via [`NavContextBuilder`][crate::NavContextBuilder].
pub struct NavContext<P: PathPlanner + 'static = GridPlanner> {
    pub(crate) config:        NavConfig,
    pub(crate) clock:         StepClock,
    pub(crate) movers:        MoverStore,
    pub(crate) obstacles:     ObstacleStore,
    pub(crate) index:         SpatialIndex,
    pub(crate) solver:        AvoidanceSolver,
    pub(crate) scheduler:     PathScheduler<P>,
    pub(crate) controllers:   BTreeMap<MoverId, MovementController>,
    /// Events emitted since the last dispatch, in emission order.
    pub(crate) events:        Vec<NavEvent>,
    pub(crate) initialized:   bool,
    /// Steps begun since the planner snapshot was last rebuilt.
    pub(crate) snapshot_age:  u64,
}

impl<P: PathPlanner + 'static> NavContext<P> {
    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    #[inline]
    pub fn clock(&self) -> &StepClock {
        &self.clock
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.clock.current_tick
    }

    #[inline]
    pub fn movers(&self) -> &MoverStore {
        &self.movers
    }

    #[inline]
    pub fn mover(&self, id: MoverId) -> Option<&Mover> {
        self.movers.get(id)
    }

    #[inline]
    pub fn obstacles(&self) -> &ObstacleStore {
        &self.obstacles
    }

    #[inline]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    #[inline]
    pub fn scheduler(&self) -> &PathScheduler<P> {
        &self.scheduler
    }

    #[inline]
    pub fn controller(&self, id: MoverId) -> Option<&MovementController> {
        self.controllers.get(&id)
    }

    /// Movement state of `id`, if registered.
    pub fn state(&self, id: MoverId) -> Option<&MovementState> {
        self.controllers.get(&id).map(MovementController::state)
    }

    // ── Movers ────────────────────────────────────────────────────────────

    /// Add a mover at `position`.  It is indexed immediately and can be
    /// commanded right away.
    pub fn register_mover(&mut self, position: Vec3, params: &MoverParams) -> NavContextResult<MoverId> {
        if !position.is_finite() {
            return Err(NavError::InvalidConfiguration(format!(
                "mover position must be finite, got {position}"
            ))
            .into());
        }
        let id = self.movers.insert(position, params);
        let mover = self.movers.try_get_mut(id)?;
        self.index.insert_mover(mover);
        self.controllers
            .insert(id, MovementController::new(id, SteerTuning::from_config(&self.config)));
        debug!("{id} registered at {position}");
        Ok(id)
    }

    /// Remove a mover.  Its in-flight path request is cancelled, the index
    /// forgets it, and any late result for it is dropped on delivery.
    pub fn unregister_mover(&mut self, id: MoverId) -> NavContextResult<Mover> {
        if !self.movers.contains(id) {
            return Err(NavError::MoverNotFound(id).into());
        }
        if let Some(mut controller) = self.controllers.remove(&id) {
            controller.stop(&mut self.scheduler);
        }
        self.index.remove_mover(id)?;
        let mut mover = self.movers.remove(id).ok_or(NavError::MoverNotFound(id))?;
        mover.mark_unindexed();
        debug!("{id} unregistered");
        Ok(mover)
    }

    /// Move instantly.  The mover keeps its goal and re-registers in the
    /// index at the next step.
    pub fn teleport(&mut self, id: MoverId, position: Vec3) -> NavContextResult<()> {
        self.movers.try_get_mut(id)?.teleport(position);
        Ok(())
    }

    pub fn set_mover_flags(&mut self, id: MoverId, flags: MoverFlags) -> NavContextResult<()> {
        self.movers.try_get_mut(id)?.set_flags(flags);
        Ok(())
    }

    pub fn set_mover_radius(&mut self, id: MoverId, radius: f32) -> NavContextResult<()> {
        self.movers.try_get_mut(id)?.set_radius(radius);
        Ok(())
    }

    // ── Obstacles ─────────────────────────────────────────────────────────

    pub fn add_obstacle(&mut self, triangle: Triangle) -> ObstacleId {
        let id = self.obstacles.insert(triangle, self.clock.current_tick);
        if let Some(obstacle) = self.obstacles.get(id) {
            self.index.insert_obstacle(obstacle);
        }
        id
    }

    /// Replace an obstacle's geometry.  Avoidance sees it from the next
    /// step; the planner from the next snapshot refresh.
    pub fn update_obstacle(&mut self, id: ObstacleId, triangle: Triangle) -> NavContextResult<()> {
        let obstacle = self.obstacles.update(id, triangle, self.clock.current_tick)?;
        self.index.update_obstacle(obstacle)?;
        Ok(())
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> NavContextResult<()> {
        self.obstacles.remove(id).ok_or(NavError::ObstacleNotFound(id))?;
        self.index.remove_obstacle(id)?;
        Ok(())
    }

    // ── Movement commands ─────────────────────────────────────────────────

    /// Plan a path to `target` and walk it.  Progress and failure arrive as
    /// events.
    pub fn move_to(&mut self, id: MoverId, target: Vec3) -> NavContextResult<()> {
        let mover = self.movers.try_get(id)?;
        let start = mover.position;
        let constraints = constraints_for(mover);
        let controller = self.controllers.get_mut(&id).ok_or(NavError::MoverNotFound(id))?;
        controller.move_to(start, target, constraints, &mut self.scheduler);
        Ok(())
    }

    /// Walk `points` in order, forever when `looping`.  Each leg is planned
    /// like a [`move_to`](Self::move_to); a leg that cannot be planned ends
    /// the route with a `PathfindingFailed` event.
    pub fn move_to_points(&mut self, id: MoverId, points: Vec<Vec3>, looping: bool) -> NavContextResult<()> {
        let mover = self.movers.try_get(id)?;
        let start = mover.position;
        let constraints = constraints_for(mover);
        let controller = self.controllers.get_mut(&id).ok_or(NavError::MoverNotFound(id))?;
        controller.move_to_points(start, points, looping, constraints, &mut self.scheduler)?;
        Ok(())
    }

    /// Chase another mover until within `reach_distance` of it; with
    /// `continuous`, keep chasing after contact.
    pub fn follow_target(
        &mut self,
        id:             MoverId,
        target:         MoverId,
        reach_distance: f32,
        continuous:     bool,
    ) -> NavContextResult<()> {
        let mover = self.movers.try_get(id)?;
        let start = mover.position;
        let constraints = constraints_for(mover);
        let target_position = self.movers.try_get(target)?.position;
        let controller = self.controllers.get_mut(&id).ok_or(NavError::MoverNotFound(id))?;
        controller.follow(
            start,
            target,
            target_position,
            reach_distance,
            continuous,
            constraints,
            &mut self.scheduler,
        )?;
        Ok(())
    }

    /// Stop moving and cancel any in-flight path request.
    pub fn stop(&mut self, id: MoverId) -> NavContextResult<()> {
        let controller = self.controllers.get_mut(&id).ok_or(NavError::MoverNotFound(id))?;
        controller.stop(&mut self.scheduler);
        Ok(())
    }

    // ── Step ──────────────────────────────────────────────────────────────

    /// Advance every mover by `dt` seconds.
    pub fn step<O: NavObserver + ?Sized>(&mut self, dt: f32, observer: &mut O) -> NavContextResult<NavStepStats> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(NavContextError::InvalidTimeStep(dt));
        }
        let tick = self.clock.current_tick;
        let mut stats = NavStepStats { tick, ..NavStepStats::default() };

        // ① Announce
        if !self.initialized {
            self.initialized = true;
            self.events.insert(0, NavEvent::Initialized);
            info!("navigation context initialized");
        }

        // ② Snapshot
        self.refresh_snapshot(tick);

        // ③ Index
        stats.reindexed = self.refresh_index();

        // ④ Steer
        let desired = self.steer(dt);

        // ⑤ Avoid
        let mut velocities = Vec::with_capacity(desired.len());
        for &(id, want) in &desired {
            let Some(mover) = self.movers.get(id) else { continue };
            let steering = self.avoid(mover, want, dt);
            if steering.outcome == SolveOutcome::Approximated {
                stats.avoidance_approximated += 1;
            }
            velocities.push((id, steering.velocity));
        }
        if stats.avoidance_approximated > 0 {
            debug!("{tick}: {} avoidance solves approximated", stats.avoidance_approximated);
        }

        // ⑥ Integrate
        for (id, velocity) in velocities {
            let Some(mover) = self.movers.get_mut(id) else { continue };
            let velocity = match mover.max_acceleration {
                Some(accel) => {
                    let change = (velocity - mover.velocity).clamp_length_max(accel.max(0.0) * dt);
                    mover.velocity + change
                }
                None => velocity,
            };
            let before = mover.position;
            mover.integrate(velocity, dt);
            if mover.position != before {
                stats.moved += 1;
            }
        }

        // ⑦ Paths
        self.deliver_paths(&mut stats);

        // ⑧ Notify
        for event in self.events.drain(..) {
            observer.on_event(&event);
        }
        observer.on_step_end(&stats, &self.movers);
        self.clock.advance(dt);
        Ok(stats)
    }

    /// Cancel every queued and running path task.  Results still in flight
    /// are discarded; controllers waiting for them stay put until given a
    /// new command.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }

    // ── Step phases ───────────────────────────────────────────────────────

    fn refresh_snapshot(&mut self, tick: Tick) {
        self.snapshot_age = self.snapshot_age.saturating_add(1);
        if self.obstacles.version() == self.scheduler.snapshot().version() {
            return;
        }
        if self.snapshot_age < self.config.snapshot_refresh_interval {
            return;
        }
        let snapshot = ObstacleSnapshot::from_store(&self.obstacles, tick);
        info!("{tick}: obstacle snapshot rebuilt ({} triangles)", snapshot.len());
        self.scheduler.set_snapshot(Arc::new(snapshot));
        self.snapshot_age = 0;
    }

    /// Lazy re-registration, then neighbour-cache staleness against the
    /// final index versions.  Returns the number of re-registered movers.
    fn refresh_index(&mut self) -> usize {
        let mut reindexed = Vec::new();
        for mover in self.movers.iter_mut() {
            if self.index.update_mover(mover) {
                reindexed.push(mover.id);
            }
        }

        let range = self.config.neighbor_distance;
        let mover_version = self.index.mover_version();
        let obstacle_version = self.index.obstacle_version();
        for mover in self.movers.iter_mut() {
            let region_changed = self.index.track_query_region(mover.id, mover.position, range);
            let moved_buckets = reindexed.binary_search(&mover.id).is_ok();

            let cache = mover.neighbors_mut();
            if moved_buckets || region_changed || cache.mover_version() != Some(mover_version) {
                cache.mark_movers_stale();
            }
            if region_changed || cache.obstacle_version() != Some(obstacle_version) {
                cache.mark_obstacles_stale();
            }

            if !mover.flags().avoiding {
                continue;
            }
            let position = mover.position;
            let cache = mover.neighbors_mut();
            if cache.movers_dirty() {
                cache.store_movers(self.index.candidate_movers(position, range), mover_version);
            }
            if cache.obstacles_dirty() {
                cache.store_obstacles(self.index.candidate_obstacles(position, range), obstacle_version);
            }
        }
        reindexed.len()
    }

    /// Hand finished path results to their controllers.
    pub(crate) fn deliver_paths(&mut self, stats: &mut NavStepStats) {
        for done in self.scheduler.poll_completed() {
            let accepted = match self.controllers.get_mut(&done.requester) {
                Some(controller) => controller.on_path_result(done.handle, done.result, &mut self.events),
                None => false,
            };
            if accepted {
                stats.paths_delivered += 1;
            } else {
                debug!("dropping path result {} for {}", done.handle, done.requester);
                stats.paths_dropped += 1;
            }
        }
    }

    fn steer(&mut self, dt: f32) -> Vec<(MoverId, Vec3)> {
        let mut desired = Vec::with_capacity(self.controllers.len());
        for (&id, controller) in self.controllers.iter_mut() {
            let Some(mover) = self.movers.get(id) else { continue };
            let input = SteerInput {
                position:    mover.position,
                max_speed:   mover.max_speed,
                constraints: constraints_for(mover),
                dt,
            };
            let velocity = controller.update(&input, &self.movers, &mut self.scheduler, &mut self.events);
            desired.push((id, velocity));
        }
        desired
    }

    /// Solve one mover against its cached candidates, filtered exactly.
    fn avoid(&self, mover: &Mover, desired: Vec3, dt: f32) -> nv_avoidance::Steering {
        let agent = AgentSnapshot::of(mover, self.config.default_time_horizon);
        if !agent.avoiding {
            return self.solver.solve(&agent, desired, &[], &[], dt);
        }

        let range = self.config.neighbor_distance;
        let cache = mover.neighbors();

        let neighbors: Vec<Neighbor> = cache
            .movers()
            .iter()
            .filter(|&&other| other != mover.id)
            .filter_map(|&other| self.movers.get(other))
            .filter(|other| other.flags().need_to_be_avoided)
            .filter(|other| {
                let reach = range + other.radius();
                other.position.distance_squared(mover.position) <= reach * reach
            })
            .map(Neighbor::of)
            .collect();

        // Geometry entirely below the mover's feet or above its head is
        // not in the way.
        let floor = mover.position.y + FLOOR_CLEARANCE;
        let ceiling = mover.position.y + mover.height;
        let obstacles: Vec<ObstacleSample> = cache
            .obstacles()
            .iter()
            .filter_map(|&id| self.obstacles.get(id))
            .filter(|o| o.bounds.overlaps_vertical(floor, ceiling))
            .filter(|o| o.triangle.distance_sq(mover.position) <= range * range)
            .map(|o| ObstacleSample { id: o.id, triangle: o.triangle })
            .collect();

        self.solver.solve(&agent, desired, &neighbors, &obstacles, dt)
    }
}

/// Planner constraints matching a mover's body.
fn constraints_for(mover: &Mover) -> PathConstraints {
    PathConstraints {
        agent_radius: mover.radius(),
        agent_height: mover.height,
        time_budget:  None,
    }
}
