//! `nv-agent` — mover records and the canonical registries.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                    |
//! |----------------|-------------------------------------------------------------|
//! | [`mover`]      | `Mover`, `MoverParams`, `MoverFlags`, `IndexState`, `NeighborCache` |
//! | [`obstacle`]   | `Obstacle` (triangle + bounds + last-update tick)           |
//! | [`store`]      | `MoverStore`, `ObstacleStore` — id-ordered registries       |
//!
//! # Ownership
//!
//! The stores own every mover and obstacle.  The spatial index and the
//! neighbour caches only hold ids, so removing a record from its store and
//! then from the index leaves no dangling reference anywhere.
//!
//! Both stores iterate in ascending id order (`BTreeMap`), which is the
//! canonical order the per-step update relies on for reproducible results.

pub mod mover;
pub mod obstacle;
pub mod store;


pub use mover::{IndexState, Mover, MoverFlags, MoverParams, NeighborCache};
pub use obstacle::Obstacle;
pub use store::{MoverStore, ObstacleStore};
