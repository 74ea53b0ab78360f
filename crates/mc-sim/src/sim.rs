//! The `Sim` struct and its run loop.

use std::rc::Rc;

use mc_carpark::{Carpark, Policy, SimEvent};
use mc_core::{SimDuration, SimTime};
use mc_sched::Scheduler;

use crate::{Arrival, SimConfig, SimObserver, SimResult};

/// Counters accumulated while a run is in progress.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimSummary {
    pub policy:      Option<Policy>,
    /// Virtual time when the run loop stopped.
    pub finished_at: SimTime,
    pub scheduled:   usize,
    pub arrived:     usize,
    pub parked:      usize,
    pub exited:      usize,
    pub migrated:    usize,
    pub rolled_back: usize,
    pub aborted:     usize,
    pub samples:     usize,
}

impl SimSummary {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::Arrived { .. } => self.arrived += 1,
            SimEvent::Parked { .. } => self.parked += 1,
            SimEvent::Exited { .. } => self.exited += 1,
            SimEvent::Migrated { .. } => self.migrated += 1,
            SimEvent::MigrationRolledBack { .. } => self.rolled_back += 1,
            SimEvent::Aborted { .. } => self.aborted += 1,
            SimEvent::Occupancy { .. } => self.samples += 1,
            _ => {}
        }
    }

    /// Vehicles that arrived and have not driven off.
    pub fn inside(&self) -> usize {
        self.arrived.saturating_sub(self.exited)
    }

    /// Vehicles still queued at the entrance or mid-park.
    pub fn waiting(&self) -> usize {
        self.arrived.saturating_sub(self.parked)
    }
}

/// The main simulation runner.
///
/// Holds the scheduler, the controller and the expanded arrival list.  The
/// run loop alternates between one scheduler step and forwarding whatever
/// events the step produced to the observer; occupancy samples are taken
/// between steps on a fixed virtual-time grid.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    pub config:  SimConfig,
    pub sched:   Scheduler,
    pub carpark: Rc<Carpark>,

    /// Arrivals with their sampled stays, consumed by the first `run`.
    pending:     Vec<(Arrival, SimDuration)>,
    next_sample: SimTime,
    summary:     SimSummary,
}

impl Sim {
    pub(crate) fn new(
        config:   SimConfig,
        sched:    Scheduler,
        carpark:  Rc<Carpark>,
        arrivals: Vec<Arrival>,
        stays:    Vec<SimDuration>,
    ) -> Self {
        let summary = SimSummary {
            policy: Some(carpark.policy()),
            scheduled: arrivals.len(),
            ..SimSummary::default()
        };
        Self {
            config,
            sched,
            carpark,
            pending: arrivals.into_iter().zip(stays).collect(),
            next_sample: SimTime::ZERO,
            summary,
        }
    }

    pub fn summary(&self) -> &SimSummary {
        &self.summary
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until every vehicle has left, the horizon is reached, or the
    /// controller reports a fatal error.
    ///
    /// Every task is dropped before returning, so the controller can be
    /// inspected afterwards but not resumed.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<SimSummary> {
        self.spawn_feeder();
        let outcome = self.run_loop(observer);
        self.sched.clear();
        self.summary.finished_at = self.sched.now();
        outcome?;

        observer.on_event(&self.carpark.occupancy(self.sched.now()));
        self.summary.samples += 1;
        observer.on_sim_end(&self.summary);

        tracing::info!(
            policy = %self.carpark.policy(),
            now = %self.summary.finished_at,
            parked = self.summary.parked,
            exited = self.summary.exited,
            migrated = self.summary.migrated,
            "simulation finished"
        );
        Ok(self.summary.clone())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// One task that releases each vehicle at its arrival time.
    fn spawn_feeder(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return;
        }
        let carpark = self.carpark.clone();
        let sched = self.sched.clone();
        self.sched.spawn(async move {
            for (arrival, stay) in pending {
                sched.sleep_until(arrival.at).await;
                sched.spawn(carpark.clone().visit(arrival.vehicle, stay));
            }
        });
    }

    fn run_loop<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        loop {
            let next = if self.sched.ready_is_empty() {
                self.sched.next_timer()
            } else {
                Some(self.sched.now())
            };
            let Some(next) = next else {
                return Ok(());
            };
            if self.config.horizon.is_some_and(|h| next > h) {
                return Ok(());
            }

            while self.next_sample <= next {
                let sample = self.carpark.occupancy(self.next_sample);
                self.summary.record(&sample);
                observer.on_event(&sample);
                self.next_sample = self.next_sample + self.config.sample_interval;
            }

            self.sched.step();
            for event in self.carpark.take_events() {
                self.summary.record(&event);
                observer.on_event(&event);
            }

            if let Some(err) = self.carpark.take_fatal() {
                tracing::error!(policy = %self.carpark.policy(), error = %err, "run stopped");
                return Err(err.into());
            }
        }
    }
}
