//! `nv-mobility` — the movement controller state machine.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`state`]      | `MovementState`, `MoveGoal`                                |
//! | [`controller`] | `MovementController`, `SteerInput`, `SteerTuning`, `TargetLookup` |
//! | [`events`]     | `NavEvent` — outbound notifications                        |
//! | [`error`]      | `MobilityError`, `MobilityResult<T>`                       |
//!
//! # State machine
//!
//! ```text
//!            move_to / move_to_points / follow
//!   Idle ──────────────────────────────────────▶ Seeking(path, waypoint)
//!    ▲  ◀── stop, new command, path failure ───   │   ▲        │
//!    │                                            │   └────────┘ waypoint passed,
//!    │                                            │              next leg, repath
//!    │                                            ▼
//!    └──────────────── stop / new command ───── Arrived
//! ```
//!
//! Every transition that matters to a collaborator pushes a [`NavEvent`]
//! into the caller's per-step buffer; nothing is delivered through global
//! callbacks.

pub mod controller;
pub mod error;
pub mod events;
pub mod state;


pub use controller::{MovementController, SteerInput, SteerTuning, TargetLookup};
pub use error::{MobilityError, MobilityResult};
pub use events::NavEvent;
pub use state::{MoveGoal, MovementState};
