//! Arrival schedules.
//!
//! # CSV format
//!
//! One row per simulated minute; only the `car_arrival_rate` column is
//! read.  Fractional values are truncated.
//!
//! ```csv
//! time,car_arrival_rate
//! 07:00,2
//! 07:01,0
//! 07:02,3
//! ```
//!
//! # Offsets within a minute
//!
//! Each of the `n` arrivals of one minute draws an integer `d` in
//! `0..=remaining` and arrives `d / 100` minutes into the minute;
//! `remaining` starts at 100 and shrinks by every draw, so early draws
//! tend to be spread wider than late ones.  Vehicle ids follow draw order,
//! which is not necessarily time order.

use std::io::Read;
use std::path::Path;

use mc_core::{SimDuration, SimRng, SimTime, VehicleId};
use serde::Deserialize;

use crate::{SimError, SimResult};

#[derive(Deserialize)]
struct ArrivalRecord {
    car_arrival_rate: f64,
}

/// One vehicle arriving at the entrance.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Arrival {
    pub vehicle: VehicleId,
    pub at:      SimTime,
}

/// Number of arrivals in each successive one-minute tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrivalSchedule {
    pub per_minute: Vec<u32>,
}

impl ArrivalSchedule {
    pub fn new(per_minute: Vec<u32>) -> Self {
        Self { per_minute }
    }

    /// `rate` arrivals every minute for `minutes` minutes.
    pub fn constant(rate: u32, minutes: usize) -> Self {
        Self { per_minute: vec![rate; minutes] }
    }

    /// Load from a CSV file with a `car_arrival_rate` column.
    pub fn from_csv_path(path: &Path) -> SimResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Like [`ArrivalSchedule::from_csv_path`] but accepts any `Read` source.
    pub fn from_reader<R: Read>(reader: R) -> SimResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let per_minute = csv_reader
            .deserialize::<ArrivalRecord>()
            .map(|row| {
                let row = row.map_err(|e| SimError::Parse(e.to_string()))?;
                if !row.car_arrival_rate.is_finite() || row.car_arrival_rate < 0.0 {
                    return Err(SimError::Parse(format!(
                        "invalid car_arrival_rate {}",
                        row.car_arrival_rate
                    )));
                }
                Ok(row.car_arrival_rate as u32)
            })
            .collect::<SimResult<Vec<u32>>>()?;
        Ok(Self { per_minute })
    }

    pub fn total(&self) -> usize {
        self.per_minute.iter().map(|&n| n as usize).sum()
    }

    pub fn minutes(&self) -> usize {
        self.per_minute.len()
    }

    /// Expand into arrivals with sequential vehicle ids from 0, sorted by
    /// time.  Arrivals at the same instant keep id order.
    pub fn arrivals(&self, rng: &mut SimRng) -> Vec<Arrival> {
        let mut out = Vec::with_capacity(self.total());
        let mut next_id = 0u32;
        for (minute, &count) in self.per_minute.iter().enumerate() {
            let base = SimTime::from_minutes(minute as f64);
            for hundredths in minute_offsets(count, rng) {
                out.push(Arrival {
                    vehicle: VehicleId(next_id),
                    at:      base + SimDuration::from_minutes(hundredths as f64 / 100.0),
                });
                next_id += 1;
            }
        }
        out.sort_by_key(|a| a.at);
        out
    }
}

/// Offsets, in hundredths of a minute, of the arrivals of one minute.  The
/// offsets never sum past 100.
pub fn minute_offsets(count: u32, rng: &mut SimRng) -> Vec<u32> {
    let mut remaining = 100u32;
    (0..count)
        .map(|_| {
            let d = rng.gen_range(0..=remaining);
            remaining -= d;
            d
        })
        .collect()
}
