//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use mc_carpark::SimEvent;
use mc_sim::{SimObserver, SimSummary};

use crate::row::{OccupancyRow, ServiceRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult, StatsCollector};

/// A [`SimObserver`] that keeps a [`StatsCollector`] and streams service and
/// occupancy rows to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    stats:      StatsCollector,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stats: StatsCollector::new(),
            last_error: None,
        }
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// Split into the writer and the collected statistics.
    pub fn into_parts(self) -> (W, StatsCollector) {
        (self.writer, self.stats)
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                tracing::warn!(error = %e, "output write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_event(&mut self, event: &SimEvent) {
        if let Some((kind, sample)) = self.stats.record(event) {
            let result = self.writer.write_service(&ServiceRow::from_sample(kind, &sample));
            self.store_err(result);
        }

        if matches!(event, SimEvent::Occupancy { .. }) {
            let rows = self.stats.occupancy.last().map(OccupancyRow::from_sample).unwrap_or_default();
            let result = self.writer.write_occupancy(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, summary: &SimSummary) {
        self.stats.on_sim_end(summary);
        let result = self.writer.finish();
        self.store_err(result);
    }
}
