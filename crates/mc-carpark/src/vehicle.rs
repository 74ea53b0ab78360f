use mc_core::{SimTime, SlotRef, VehicleId};

/// Public view of a vehicle inside the carpark.
///
/// `slot` is `None` from arrival until park commit and again once the exit
/// workflow has released the lot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vehicle {
    pub id:         VehicleId,
    pub slot:       Option<SlotRef>,
    /// Cache-migration stage marker; 0 when no migration is in flight.
    pub marker:     u8,
    pub arrived_at: SimTime,
    pub parked_at:  Option<SimTime>,
}

impl Vehicle {
    pub fn new(id: VehicleId, arrived_at: SimTime) -> Self {
        Self { id, slot: None, marker: 0, arrived_at, parked_at: None }
    }

    pub fn is_parked(&self) -> bool {
        self.slot.is_some()
    }
}
