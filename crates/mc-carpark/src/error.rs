use mc_core::{LevelId, VehicleId};
use mc_travel::TravelError;
use thiserror::Error;

use crate::Policy;

#[derive(Debug, Error)]
pub enum CarparkError {
    /// No level can ever satisfy the policy's acceptance condition.
    #[error("policy {0} can never accept a vehicle with this layout")]
    PolicyExhausted(Policy),

    /// The migration state machine reached a marker with no undo path.
    #[error("{vehicle} migration has no rollback for stage marker {marker}")]
    InvalidStateTransition { vehicle: VehicleId, marker: u8 },

    /// A level reservation was held but every lot on the level is occupied.
    #[error("{vehicle} holds a reservation on {level} but no lot is free")]
    NoFreeLot { vehicle: VehicleId, level: LevelId },

    #[error("{0} is not known to the carpark")]
    UnknownVehicle(VehicleId),

    #[error("{0} is not parked")]
    NotParked(VehicleId),

    #[error("{0} is already in the carpark")]
    DuplicateVehicle(VehicleId),

    #[error("travel model error: {0}")]
    Travel(#[from] TravelError),
}

pub type CarparkResult<T> = Result<T, CarparkError>;
