//! `nv-output` — recording navigation runs to disk.
//!
//! | Backend | Files created                              |
//! |---------|--------------------------------------------|
//! | CSV     | `mover_positions.csv`, `nav_events.csv`    |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`RecordingObserver`], which implements `nv_nav::NavObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nv_output::{CsvWriter, RecordingObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut rec = RecordingObserver::new(writer, 10);
//! for _ in 0..steps {
//!     nav.step(dt, &mut rec)?;
//! }
//! rec.finish();
//! if let Some(e) = rec.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::RecordingObserver;
pub use row::{EventRow, MoverPositionRow};
pub use writer::OutputWriter;
