//! `AvoidanceSolver` — turns a desired velocity into a collision-free one.

use log::trace;

use nv_agent::Mover;
use nv_core::geom::{ground, lift};
use nv_core::{MoverId, NavConfig, ObstacleId, Triangle, Vec2, Vec3};

use crate::lp::{solve_2d, solve_3d};
use crate::orca::{Encounter, orca_line};
use crate::OrcaLine;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// The avoiding agent, frozen at the start of the step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub id:        MoverId,
    pub position:  Vec3,
    pub velocity:  Vec3,
    pub radius:    f32,
    pub max_speed: f32,
    /// Horizon against other movers.
    pub tau:       f32,
    pub avoiding:  bool,
}

impl AgentSnapshot {
    pub fn of(mover: &Mover, default_tau: f32) -> Self {
        Self {
            id:        mover.id,
            position:  mover.position,
            velocity:  mover.velocity,
            radius:    mover.radius(),
            max_speed: mover.max_speed,
            tau:       mover.tau(default_tau),
            avoiding:  mover.flags().avoiding,
        }
    }
}

/// Another mover the agent must keep clear of.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbor {
    pub id:       MoverId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius:   f32,
    /// Whether the neighbour runs avoidance itself (shares the effort).
    pub avoiding: bool,
}

impl Neighbor {
    pub fn of(mover: &Mover) -> Self {
        Self {
            id:       mover.id,
            position: mover.position,
            velocity: mover.velocity,
            radius:   mover.radius(),
            avoiding: mover.flags().avoiding,
        }
    }
}

/// An obstacle triangle near the agent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObstacleSample {
    pub id:       ObstacleId,
    pub triangle: Triangle,
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// How the returned velocity was obtained.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The agent does not avoid; the desired velocity passed through.
    Skipped,
    /// No constraint applied; the desired velocity passed through.
    Unconstrained,
    /// Closest point of the feasible region to the desired velocity.
    Feasible,
    /// The constraints were jointly infeasible; the velocity minimises the
    /// largest violation instead.
    Approximated,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Steering {
    pub velocity: Vec3,
    pub outcome:  SolveOutcome,
}

// ── Solver ────────────────────────────────────────────────────────────────────

/// Stateless ORCA solver.  One instance serves every agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AvoidanceSolver {
    /// Horizon against obstacle triangles.
    pub obstacle_time_horizon: f32,
    /// Radius given to the closest point of each obstacle triangle.
    pub danger_distance:       f32,
    /// Nearest mover neighbours considered per solve.
    pub max_neighbors:         usize,
}

impl AvoidanceSolver {
    pub fn new(obstacle_time_horizon: f32, danger_distance: f32, max_neighbors: usize) -> Self {
        Self { obstacle_time_horizon, danger_distance, max_neighbors }
    }

    pub fn from_config(config: &NavConfig) -> Self {
        Self::new(
            config.obstacle_time_horizon,
            config.obstacle_danger_distance,
            config.max_neighbors,
        )
    }

    /// Compute the steering velocity for one agent and one step of `dt`.
    ///
    /// `neighbors` and `obstacles` may arrive in any order.  The agent
    /// itself is ignored if it appears in `neighbors`.
    pub fn solve(
        &self,
        agent: &AgentSnapshot,
        desired: Vec3,
        neighbors: &[Neighbor],
        obstacles: &[ObstacleSample],
        dt: f32,
    ) -> Steering {
        if !agent.avoiding {
            return Steering { velocity: desired, outcome: SolveOutcome::Skipped };
        }

        let lines = self.build_lines(agent, neighbors, obstacles, dt);
        if lines.is_empty() {
            return Steering { velocity: desired, outcome: SolveOutcome::Unconstrained };
        }

        let preferred = ground(desired);
        let (mut solved, failed_at) = solve_2d(&lines, agent.max_speed, preferred, false);
        let outcome = if failed_at < lines.len() {
            solved = solve_3d(&lines, failed_at, agent.max_speed, solved);
            trace!("{}: avoidance infeasible at line {failed_at}/{}", agent.id, lines.len());
            SolveOutcome::Approximated
        } else {
            SolveOutcome::Feasible
        };

        Steering { velocity: lift(solved, desired.y), outcome }
    }

    /// Half-planes in canonical order: obstacles by id, then movers by id.
    pub fn build_lines(
        &self,
        agent: &AgentSnapshot,
        neighbors: &[Neighbor],
        obstacles: &[ObstacleSample],
        dt: f32,
    ) -> Vec<OrcaLine> {
        let position = ground(agent.position);
        let velocity = ground(agent.velocity);

        let mut sorted_obstacles: Vec<&ObstacleSample> = obstacles.iter().collect();
        sorted_obstacles.sort_by_key(|o| o.id);

        let mut lines = Vec::with_capacity(sorted_obstacles.len() + self.max_neighbors);
        for obstacle in sorted_obstacles {
            let closest = ground(obstacle.triangle.closest_point(agent.position));
            let encounter = Encounter {
                relative_position: closest - position,
                relative_velocity: velocity,
                combined_radius:   agent.radius + self.danger_distance,
                tau:               self.obstacle_time_horizon,
                responsibility:    1.0,
                tie_break:         Vec2::X,
            };
            lines.push(orca_line(&encounter, velocity, dt));
        }

        for neighbor in self.nearest(agent, neighbors) {
            let encounter = Encounter {
                relative_position: ground(neighbor.position) - position,
                relative_velocity: velocity - ground(neighbor.velocity),
                combined_radius:   agent.radius + neighbor.radius,
                tau:               agent.tau,
                responsibility:    if neighbor.avoiding { 0.5 } else { 1.0 },
                // Coincident pairs split along opposite directions.
                tie_break:         if agent.id < neighbor.id { -Vec2::X } else { Vec2::X },
            };
            lines.push(orca_line(&encounter, velocity, dt));
        }
        lines
    }

    /// Up to `max_neighbors` closest neighbours (distance, then id), returned
    /// in ascending id order.
    fn nearest<'a>(&self, agent: &AgentSnapshot, neighbors: &'a [Neighbor]) -> Vec<&'a Neighbor> {
        let mut ranked: Vec<(f32, &Neighbor)> = neighbors
            .iter()
            .filter(|n| n.id != agent.id)
            .map(|n| (ground(n.position).distance_squared(ground(agent.position)), n))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.id.cmp(&b.1.id)));
        ranked.truncate(self.max_neighbors);

        let mut kept: Vec<&Neighbor> = ranked.into_iter().map(|(_, n)| n).collect();
        kept.sort_by_key(|n| n.id);
        kept
    }
}
