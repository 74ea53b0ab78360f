//! Plain data row types written by output backends.

use std::fmt;

use crate::{OccupancySample, ServiceSample};

/// Which half of a visit a service row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Park,
    Retrieve,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceKind::Park => "park",
            ServiceKind::Retrieve => "retrieve",
        })
    }
}

/// One completed park or retrieval, in minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceRow {
    pub vehicle:     u32,
    pub kind:        ServiceKind,
    /// When the park or retrieval finished.
    pub at_min:      f64,
    pub wait_min:    f64,
    pub service_min: f64,
}

impl ServiceRow {
    pub fn from_sample(kind: ServiceKind, sample: &ServiceSample) -> Self {
        Self {
            vehicle:     sample.vehicle.0,
            kind,
            at_min:      sample.at.as_minutes(),
            wait_min:    sample.wait.as_minutes(),
            service_min: sample.service.as_minutes(),
        }
    }
}

/// One level's occupancy at one sample instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyRow {
    pub at_min:   f64,
    pub level:    u16,
    pub occupied: usize,
    pub capacity: usize,
}

impl OccupancyRow {
    /// One row per level of `sample`.
    pub fn from_sample(sample: &OccupancySample) -> Vec<Self> {
        sample
            .occupied
            .iter()
            .zip(&sample.capacity)
            .enumerate()
            .map(|(level, (&occupied, &capacity))| Self {
                at_min: sample.at.as_minutes(),
                level: level as u16,
                occupied,
                capacity,
            })
            .collect()
    }

    /// Occupied share of the level; zero for an empty layout.
    pub fn ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.occupied as f64 / self.capacity as f64
        }
    }
}
