//! `nv-spatial` — the bucket-grid spatial index.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`bucket`]  | `BucketKey`, `BucketRange` (integer cell coordinates)     |
//! | [`index`]   | `SpatialIndex`, `IndexedMover`, `IndexStats`              |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Membership rule
//!
//! A mover is registered in exactly the buckets its bounding sphere's AABB
//! overlaps; an obstacle in exactly the buckets its triangle's AABB overlaps.
//! Queries visit only the buckets overlapping the query sphere and then
//! filter candidates by exact distance, so results never depend on bucket
//! size or on insertion order.

pub mod bucket;
pub mod error;
pub mod index;

#[cfg(test)]
mod tests;

pub use bucket::{BucketKey, BucketRange};
pub use error::{SpatialError, SpatialResult};
pub use index::{IndexStats, IndexedMover, SpatialIndex};
