//! `nv-nav` — the navigation context for the rust_nav navigation core.
//!
//! # Per-step update
//!
//! ```text
//! NavContext::step(dt, observer):
//!   ① Announce  — `Initialized` is queued on the very first step.
//!   ② Snapshot  — rebuild the planner's obstacle snapshot when geometry
//!                 changed and `snapshot_refresh_interval` steps have passed.
//!   ③ Index     — lazy re-registration of every mover (ascending id), then
//!                 neighbour-cache staleness marking and refill.
//!   ④ Steer     — each controller turns its goal into a desired velocity,
//!                 queueing events as it transitions.
//!   ⑤ Avoid     — ORCA for every avoiding mover against frozen pre-step state.
//!   ⑥ Integrate — acceleration clamp, then position and velocity update.
//!   ⑦ Paths     — drain finished path tasks and route them to controllers;
//!                 results nobody waits for any more are dropped.
//!   ⑧ Notify    — dispatch queued events in order, then `on_step_end`.
//! ```
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use nv_agent::MoverParams;
//! use nv_core::{NavConfig, Vec3};
//! use nv_nav::{NavContextBuilder, NoopObserver};
//!
//! let mut nav = NavContextBuilder::new(NavConfig::default()).build()?;
//! let id = nav.register_mover(Vec3::ZERO, &MoverParams::default())?;
//! nav.move_to(id, Vec3::new(10.0, 0.0, 0.0))?;
//! for _ in 0..600 {
//!     nav.step(1.0 / 60.0, &mut NoopObserver)?;
//! }
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod observer;


pub use builder::NavContextBuilder;
pub use context::NavContext;
pub use error::{NavContextError, NavContextResult};
pub use observer::{NavObserver, NavStepStats, NoopObserver};
