//! `nv-core` — foundational types for the `rust_nav` navigation core.
//!
//! This crate is a dependency of every other `nv-*` crate.  It has no `nv-*`
//! dependencies and minimal external ones (`glam` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `MoverId`, `ObstacleId`, `TaskHandle`                 |
//! | [`geom`]        | `Aabb`, `Triangle`, ground-plane helpers              |
//! | [`time`]        | `Tick`, `StepClock`                                   |
//! | [`config`]      | `NavConfig` and its start-up validation               |
//! | [`error`]       | `NavError`, `NavResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geom;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::NavConfig;
pub use error::{NavError, NavResult};
pub use geom::{Aabb, Triangle};
pub use glam::{Vec2, Vec3};
pub use ids::{MoverId, ObstacleId, TaskHandle};
pub use time::{StepClock, Tick};
