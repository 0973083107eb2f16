//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `mover_positions.csv`
//! - `nav_events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{EventRow, MoverPositionRow, OutputResult};

/// Writes navigation output to two CSV files.
pub struct CsvWriter {
    positions: Writer<File>,
    events:    Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut positions = Writer::from_path(dir.join("mover_positions.csv"))?;
        positions.write_record(["tick", "mover_id", "x", "y", "z", "speed"])?;

        let mut events = Writer::from_path(dir.join("nav_events.csv"))?;
        events.write_record(["tick", "mover_id", "kind", "detail"])?;

        Ok(Self { positions, events, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_positions(&mut self, rows: &[MoverPositionRow]) -> OutputResult<()> {
        for row in rows {
            self.positions.write_record(&[
                row.tick.to_string(),
                row.mover_id.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                row.z.to_string(),
                row.speed.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        for row in rows {
            self.events.write_record(&[
                row.tick.to_string(),
                row.mover_id.to_string(),
                row.kind.to_string(),
                row.detail.clone(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.positions.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
