//! `mc-output`: statistics and output writers for the carpark simulator.
//!
//! | Type                  | Role                                                      |
//! |-----------------------|-----------------------------------------------------------|
//! | [`StatsCollector`]    | Counters, wait/service samples and the occupancy series.  |
//! | [`CsvWriter`]         | `service_times.csv` and `occupancy.csv`.                  |
//! | [`SimOutputObserver`] | Feeds a collector and streams rows to any [`OutputWriter`]. |
//! | [`write_stats`]       | Dumps a finished collector to any [`OutputWriter`].       |
//!
//! Both observers only consume events; nothing here feeds back into the run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mc_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! println!("{}", obs.stats().report());
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod stats;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{OccupancyRow, ServiceKind, ServiceRow};
pub use stats::{OccupancySample, ServiceSample, StatsCollector, StatsReport};
pub use writer::{OutputWriter, write_stats};
