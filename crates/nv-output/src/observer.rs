//! `RecordingObserver<W>` — bridges `NavObserver` to an `OutputWriter`.

use nv_agent::MoverStore;
use nv_mobility::NavEvent;
use nv_nav::{NavObserver, NavStepStats};

use crate::row::{EventRow, MoverPositionRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`NavObserver`] that records every event and, every `interval` steps,
/// every mover's position to any [`OutputWriter`] backend.
///
/// Events carry no tick of their own; they are buffered during the step and
/// stamped with the step's tick in `on_step_end`.
///
/// Errors from the writer are stored internally because `NavObserver`
/// methods have no return value.  Check with [`take_error`][Self::take_error].
pub struct RecordingObserver<W: OutputWriter> {
    writer:     W,
    interval:   u64,
    pending:    Vec<NavEvent>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> RecordingObserver<W> {
    /// Record positions every `interval` steps (0 is treated as 1).
    pub fn new(writer: W, interval: u64) -> Self {
        Self { writer, interval: interval.max(1), pending: Vec::new(), last_error: None }
    }

    /// Take the stored write error (if any).
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Flush the backend.  Call once after the last step.
    pub fn finish(&mut self) {
        let result = self.writer.finish();
        self.store_err(result);
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> NavObserver for RecordingObserver<W> {
    fn on_event(&mut self, event: &NavEvent) {
        self.pending.push(event.clone());
    }

    fn on_step_end(&mut self, stats: &NavStepStats, movers: &MoverStore) {
        let tick = stats.tick.0;

        if !self.pending.is_empty() {
            let rows: Vec<EventRow> = self.pending.drain(..).map(|e| event_row(tick, &e)).collect();
            let result = self.writer.write_events(&rows);
            self.store_err(result);
        }

        if tick % self.interval == 0 && !movers.is_empty() {
            let rows: Vec<MoverPositionRow> = movers
                .iter()
                .map(|m| MoverPositionRow {
                    tick,
                    mover_id: m.id.0,
                    x:        m.position.x,
                    y:        m.position.y,
                    z:        m.position.z,
                    speed:    m.velocity.length(),
                })
                .collect();
            let result = self.writer.write_positions(&rows);
            self.store_err(result);
        }
    }
}

fn event_row(tick: u64, event: &NavEvent) -> EventRow {
    let detail = match event {
        NavEvent::Initialized | NavEvent::Finished { .. } => String::new(),
        NavEvent::PathUpdated { path, .. } => format!("waypoints={}", path.len()),
        NavEvent::WaypointPassed { index, point, .. } => {
            format!("index={index} x={} y={} z={}", point.x, point.y, point.z)
        }
        NavEvent::PathfindingFailed { error, .. } => error.to_string(),
        NavEvent::TargetReached { target, .. } | NavEvent::TargetLost { target, .. } => {
            format!("target={}", target.0)
        }
    };
    EventRow {
        tick,
        mover_id: event.mover().map_or(u32::MAX, |m| m.0),
        kind: event.kind(),
        detail,
    }
}
