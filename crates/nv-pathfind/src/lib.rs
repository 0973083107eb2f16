//! `nv-pathfind` — long-range paths computed off the main step.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`request`]   | `PathRequest`, `PathConstraints`, `Path`                   |
//! | [`snapshot`]  | `ObstacleSnapshot` — frozen R-tree of obstacle triangles   |
//! | [`planner`]   | `PathPlanner` trait, `GridPlanner` (XZ grid A*)            |
//! | [`scheduler`] | `PathScheduler`, `PathService`, `CancelToken`, `CompletedPath` |
//! | [`error`]     | `PathfindingError`, `PathErrorKind`, `PathResult<T>`       |
//!
//! # Threading
//!
//! Only [`PathPlanner::plan`] runs on worker threads.  It sees an immutable
//! request and an `Arc<ObstacleSnapshot>` taken when the task started; every
//! other type here is owned and mutated by the main step.

pub mod error;
pub mod planner;
pub mod request;
pub mod scheduler;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use error::{PathErrorKind, PathResult, PathfindingError};
pub use planner::{GridPlanner, PathPlanner};
pub use request::{Path, PathConstraints, PathRequest};
pub use scheduler::{CancelToken, CompletedPath, PathScheduler, PathService, SchedulerStats};
pub use snapshot::ObstacleSnapshot;
