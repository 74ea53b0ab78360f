//! The `OutputWriter` trait implemented by backend writers.

use crate::{OccupancyRow, OutputResult, ServiceKind, ServiceRow, StatsCollector};

/// Sink for rows produced by [`SimOutputObserver`][crate::SimOutputObserver].
///
/// Errors are stored by the observer and retrieved with
/// [`SimOutputObserver::take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write one completed park or retrieval.
    fn write_service(&mut self, row: &ServiceRow) -> OutputResult<()>;

    /// Write one occupancy sample, one row per level.
    fn write_occupancy(&mut self, rows: &[OccupancyRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent; safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Write everything `stats` collected, then finish.
pub fn write_stats<W: OutputWriter>(writer: &mut W, stats: &StatsCollector) -> OutputResult<()> {
    for kind in [ServiceKind::Park, ServiceKind::Retrieve] {
        for sample in stats.samples(kind) {
            writer.write_service(&ServiceRow::from_sample(kind, sample))?;
        }
    }
    for sample in &stats.occupancy {
        writer.write_occupancy(&OccupancyRow::from_sample(sample))?;
    }
    writer.finish()
}
