//! The `OutputWriter` trait implemented by all backend writers.

use crate::{EventRow, MoverPositionRow, OutputResult};

/// Sink for recorded rows.
///
/// All methods are infallible from the observer's perspective: errors are
/// stored internally and retrieved with
/// [`RecordingObserver::take_error`][crate::RecordingObserver::take_error].
pub trait OutputWriter {
    /// Write one batch of mover positions (one step's worth).
    fn write_positions(&mut self, rows: &[MoverPositionRow]) -> OutputResult<()>;

    /// Write the events dispatched during one step, in order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
