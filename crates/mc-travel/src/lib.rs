//! `mc-travel`: transport stage travel-time model.
//!
//! Pure functions of the layout configuration: no randomness, no state.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                  |
//! |-----------|-----------------------------------------------------------|
//! | [`model`] | `Stage`, `StageTimes`, `TravelParams`                     |
//! | [`table`] | `TravelTable` (lot → stage times), `TravelModel`          |
//! | [`error`] | `TravelError`, `TravelResult<T>`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on stage and param types.  |

pub mod error;
pub mod model;
pub mod table;

#[cfg(test)]
mod tests;

pub use error::{TravelError, TravelResult};
pub use model::{Stage, StageTimes, TravelParams};
pub use table::{TravelModel, TravelTable};
