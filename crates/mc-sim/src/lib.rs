//! `mc-sim`: run loop orchestrator for the mechanised carpark simulator.
//!
//! # Run loop
//!
//! ```text
//! build:  validate configs → travel tables → controller
//!         expand arrival schedule → sample one stay per vehicle
//! run:    spawn feeder (one `visit` task per arrival, at its arrival time)
//!         loop:
//!           ① Sample : occupancy snapshots up to the next pending event
//!           ② Step   : poll one ready task or fire the next timer
//!           ③ Forward: drain controller events to the observer
//!           ④ Check  : stop on a fatal controller error
//!         until no work remains or the horizon is passed
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | [`compare`] runs policies on Rayon's thread pool.      |
//! | `serde`    | Serde derives on config, schedules and summaries.      |

pub mod arrivals;
pub mod builder;
pub mod compare;
pub mod config;
pub mod error;
pub mod observer;
pub mod sim;
pub mod stay;


pub use arrivals::{Arrival, ArrivalSchedule, minute_offsets};
pub use builder::SimBuilder;
pub use compare::{PolicyRun, Scenario, compare};
pub use config::{DEFAULT_SAMPLE_INTERVAL, SimConfig};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{Sim, SimSummary};
pub use stay::{SURVEY_WEIBULL_SCALE_MIN, SURVEY_WEIBULL_SHAPE, StaySampler};
