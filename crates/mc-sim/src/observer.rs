//! Simulation observer trait for data collection.

use mc_carpark::SimEvent;

use crate::SimSummary;

/// Callbacks invoked by [`Sim::run`][crate::Sim::run].
///
/// Events arrive in the order the controller produced them, between
/// scheduler steps.  Observers never feed back into the run.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait SimObserver {
    /// Called once per controller event, including occupancy samples.
    fn on_event(&mut self, _event: &SimEvent) {}

    /// Called once after the run loop stops.
    fn on_sim_end(&mut self, _summary: &SimSummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Keeps every event.  Mostly useful in tests.
impl SimObserver for Vec<SimEvent> {
    fn on_event(&mut self, event: &SimEvent) {
        self.push(event.clone());
    }
}
