//! `mc-carpark`: the carpark controller.
//!
//! Owns per-level occupancy, the lift/lobby/shuttle pools and the
//! placement policy, and runs the park, exit and cache-migration workflows
//! as tasks on an `mc-sched` scheduler.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`carpark`]   | `Carpark`: state, pools, motion primitives, snapshots     |
//! | [`workflow`]  | level selection, park, exit, `admit`, `visit`              |
//! | [`migration`] | ground-to-upper relocation with marker-based rollback      |
//! | [`policy`]    | `Policy` and the pure level/lot selectors                  |
//! | [`state`]     | `LevelState`, `CarparkState`                               |
//! | [`units`]     | `Lift`, `LiftKind`, `Shuttle`                              |
//! | [`vehicle`]   | `Vehicle`                                                  |
//! | [`event`]     | `SimEvent`, `EntityRef`, `Position`, `MigrationOutcome`    |
//! | [`error`]     | `CarparkError`, `CarparkResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | Derives serde traits on state snapshots, vehicles and events. |

pub mod carpark;
pub mod error;
pub mod event;
pub mod migration;
pub mod policy;
pub mod state;
pub mod units;
pub mod vehicle;
pub mod workflow;


pub use carpark::Carpark;
pub use error::{CarparkError, CarparkResult};
pub use event::{EntityRef, MigrationOutcome, Position, SimEvent};
pub use migration::{RollbackPlan, rollback_plan};
pub use policy::{GROUND, Policy};
pub use state::{CarparkState, LevelState};
pub use units::{Lift, LiftKind, Shuttle};
pub use vehicle::Vehicle;
