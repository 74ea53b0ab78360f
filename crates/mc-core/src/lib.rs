//! `mc-core`: foundational types for the mechanised carpark simulator.
//!
//! This crate is a dependency of every other `mc-*` crate.  It intentionally
//! has no `mc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`ids`]    | `VehicleId`, `LiftId`, `ShuttleId`, `LevelId`, `LotId`, `SlotRef` |
//! | [`time`]   | `SimTime`, `SimDuration`, `round2`                          |
//! | [`rng`]    | `SimRng`                                                    |
//! | [`config`] | `CarparkConfig`, `LotGeometry`, `Speeds`, `LobbyConfig`     |
//! | [`error`]  | `CoreError`, `CoreResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, time and config.    |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{CarparkConfig, LobbyConfig, LotGeometry, Speeds};
pub use error::{CoreError, CoreResult};
pub use ids::{LevelId, LiftId, LotId, ShuttleId, SlotRef, VehicleId};
pub use rng::SimRng;
pub use time::{SimDuration, SimTime, round2};
