//! `nv-avoidance` — velocity-obstacle local avoidance.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`orca`]   | `OrcaLine` and the per-neighbour half-plane construction     |
//! | [`lp`]     | 1-D/2-D/3-D linear programs over half-planes and a disk      |
//! | [`solver`] | `AvoidanceSolver`, `AgentSnapshot`, `Neighbor`, `Steering`   |
//!
//! # Plane
//!
//! Avoidance is solved in the XZ ground plane.  Positions and velocities are
//! projected with [`nv_core::geom::ground`]; the solved velocity keeps the
//! desired vertical component unchanged.
//!
//! # Determinism
//!
//! The solver canonicalises its inputs before folding constraints: obstacle
//! lines come first in ascending `ObstacleId`, then mover lines in ascending
//! `MoverId`.  Caller-side ordering therefore never affects the result, and
//! identical inputs give bit-identical output.

pub mod lp;
pub mod orca;
pub mod solver;


pub use orca::OrcaLine;
pub use solver::{AgentSnapshot, AvoidanceSolver, Neighbor, ObstacleSample, SolveOutcome, Steering};

/// Tolerance for treating two half-plane boundaries as parallel.
///
/// Chosen well above `f32` rounding noise for velocities of a few units per
/// second, and well below any meaningful angular difference.
pub const EPSILON: f32 = 1e-5;
