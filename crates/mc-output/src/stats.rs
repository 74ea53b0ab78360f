//! `StatsCollector`: lifecycle counters and timing samples.
//!
//! Timing samples are keyed by vehicle id and kept in completion order.  A
//! retrieval sample needs two events: `Released` carries the service time
//! and `Exited` carries the wait measured from the retrieval request.

use std::fmt;

use rustc_hash::FxHashMap;

use mc_carpark::SimEvent;
use mc_core::{SimDuration, SimTime, VehicleId};
use mc_sim::{SimObserver, SimSummary};

use crate::ServiceKind;

/// One completed park or retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSample {
    pub vehicle: VehicleId,
    pub at:      SimTime,
    pub wait:    SimDuration,
    pub service: SimDuration,
}

/// Per-level occupancy at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySample {
    pub at:       SimTime,
    pub occupied: Vec<usize>,
    pub capacity: Vec<usize>,
}

impl OccupancySample {
    pub fn ratio(&self, level: usize) -> Option<f64> {
        let cap = *self.capacity.get(level)?;
        let occ = *self.occupied.get(level)?;
        Some(if cap == 0 { 0.0 } else { occ as f64 / cap as f64 })
    }
}

/// Collects everything a policy comparison reports on.
#[derive(Debug, Default)]
pub struct StatsCollector {
    pub arrived:     usize,
    pub parked:      usize,
    pub exited:      usize,
    pub migrated:    usize,
    pub rolled_back: usize,
    pub aborted:     usize,

    pub park:      Vec<ServiceSample>,
    pub retrieve:  Vec<ServiceSample>,
    pub occupancy: Vec<OccupancySample>,

    /// Release service times waiting for the matching `Exited`.
    released: FxHashMap<VehicleId, SimDuration>,
    summary:  Option<SimSummary>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in.  Returns the timing sample it completed, if any.
    pub fn record(&mut self, event: &SimEvent) -> Option<(ServiceKind, ServiceSample)> {
        match event {
            SimEvent::Arrived { .. } => self.arrived += 1,
            SimEvent::Parked { vehicle, at, wait, service, .. } => {
                self.parked += 1;
                let sample = ServiceSample { vehicle: *vehicle, at: *at, wait: *wait, service: *service };
                self.park.push(sample);
                return Some((ServiceKind::Park, sample));
            }
            SimEvent::Released { vehicle, service, .. } => {
                self.released.insert(*vehicle, *service);
            }
            SimEvent::Exited { vehicle, at, wait } => {
                self.exited += 1;
                let service = self.released.remove(vehicle).unwrap_or_default();
                let sample = ServiceSample { vehicle: *vehicle, at: *at, wait: *wait, service };
                self.retrieve.push(sample);
                return Some((ServiceKind::Retrieve, sample));
            }
            SimEvent::Migrated { .. } => self.migrated += 1,
            SimEvent::MigrationRolledBack { .. } => self.rolled_back += 1,
            SimEvent::Aborted { vehicle, .. } => {
                self.aborted += 1;
                self.released.remove(vehicle);
            }
            SimEvent::Occupancy { at, occupied, capacity } => {
                self.occupancy.push(OccupancySample {
                    at:       *at,
                    occupied: occupied.clone(),
                    capacity: capacity.clone(),
                });
            }
            SimEvent::Motion { .. } | SimEvent::Stage { .. } => {}
        }
        None
    }

    /// Vehicles queued at the entrance or mid-park.
    pub fn waiting(&self) -> usize {
        self.arrived.saturating_sub(self.parked + self.aborted)
    }

    /// Vehicles parked and not yet driven off.
    pub fn inside(&self) -> usize {
        self.parked.saturating_sub(self.exited)
    }

    /// The run summary, once `on_sim_end` has been called.
    pub fn summary(&self) -> Option<&SimSummary> {
        self.summary.as_ref()
    }

    pub fn samples(&self, kind: ServiceKind) -> &[ServiceSample] {
        match kind {
            ServiceKind::Park => &self.park,
            ServiceKind::Retrieve => &self.retrieve,
        }
    }

    /// Mean wait in minutes, `None` with no samples.
    pub fn mean_wait(&self, kind: ServiceKind) -> Option<f64> {
        mean(self.samples(kind).iter().map(|s| s.wait.as_minutes()))
    }

    /// Mean service time in minutes, `None` with no samples.
    pub fn mean_service(&self, kind: ServiceKind) -> Option<f64> {
        mean(self.samples(kind).iter().map(|s| s.service.as_minutes()))
    }

    /// Mean occupancy ratio of `level` over every sample.
    pub fn mean_occupancy(&self, level: usize) -> Option<f64> {
        mean(self.occupancy.iter().filter_map(|s| s.ratio(level)))
    }

    /// Highest total occupancy seen in any sample.
    pub fn peak_occupied(&self) -> usize {
        self.occupancy
            .iter()
            .map(|s| s.occupied.iter().sum::<usize>())
            .max()
            .unwrap_or(0)
    }

    pub fn report(&self) -> StatsReport {
        let levels = self.occupancy.first().map_or(0, |s| s.capacity.len());
        StatsReport {
            parked:           self.parked,
            exited:           self.exited,
            waiting:          self.waiting(),
            migrated:         self.migrated,
            aborted:          self.aborted,
            park_wait:        self.mean_wait(ServiceKind::Park),
            park_service:     self.mean_service(ServiceKind::Park),
            retrieve_wait:    self.mean_wait(ServiceKind::Retrieve),
            retrieve_service: self.mean_service(ServiceKind::Retrieve),
            occupancy:        (0..levels).map(|l| self.mean_occupancy(l).unwrap_or(0.0)).collect(),
        }
    }
}

impl SimObserver for StatsCollector {
    fn on_event(&mut self, event: &SimEvent) {
        self.record(event);
    }

    fn on_sim_end(&mut self, summary: &SimSummary) {
        if !self.released.is_empty() {
            tracing::debug!(pending = self.released.len(), "run ended with retrievals in progress");
        }
        self.summary = Some(summary.clone());
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

// ── Report ────────────────────────────────────────────────────────────────────

/// Headline numbers for one run; all times in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub parked:           usize,
    pub exited:           usize,
    pub waiting:          usize,
    pub migrated:         usize,
    pub aborted:          usize,
    pub park_wait:        Option<f64>,
    pub park_service:     Option<f64>,
    pub retrieve_wait:    Option<f64>,
    pub retrieve_service: Option<f64>,
    /// Mean occupancy ratio per level.
    pub occupancy:        Vec<f64>,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(v: Option<f64>) -> String {
            v.map_or_else(|| "-".into(), |v| format!("{v:.2}"))
        }
        writeln!(
            f,
            "parked {}  exited {}  waiting {}  migrated {}  aborted {}",
            self.parked, self.exited, self.waiting, self.migrated, self.aborted
        )?;
        writeln!(
            f,
            "park wait {} service {}  |  retrieve wait {} service {}",
            opt(self.park_wait),
            opt(self.park_service),
            opt(self.retrieve_wait),
            opt(self.retrieve_service)
        )?;
        write!(f, "mean occupancy")?;
        for (level, ratio) in self.occupancy.iter().enumerate() {
            write!(f, "  L{level} {:.1}%", ratio * 100.0)?;
        }
        Ok(())
    }
}
