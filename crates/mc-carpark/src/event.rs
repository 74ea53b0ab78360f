//! Records the controller produces for rendering, statistics and logging
//! collaborators.  They are buffered in order of occurrence and never read
//! back by the controller.

use mc_core::{LevelId, LiftId, ShuttleId, SimDuration, SimTime, SlotRef, VehicleId};

/// The moving thing a [`SimEvent::Motion`] refers to.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityRef {
    Lift(LiftId),
    Lobby(LiftId),
    Shuttle { level: LevelId, id: ShuttleId },
    Vehicle(VehicleId),
}

impl EntityRef {
    pub fn kind(&self) -> &'static str {
        match self {
            EntityRef::Lift(_)        => "lift",
            EntityRef::Lobby(_)       => "lobby",
            EntityRef::Shuttle { .. } => "shuttle",
            EntityRef::Vehicle(_)     => "vehicle",
        }
    }
}

/// Where an entity is, in the coordinates of its kind.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Position {
    /// Vertical position of a lift.
    Level(LevelId),
    /// A lift stopped partway through a move from `from` towards `to`,
    /// `travelled` into it.
    InShaft {
        from:      LevelId,
        to:        LevelId,
        travelled: SimDuration,
    },
    /// Lateral track coordinate on a level.
    Lateral(u32),
    /// Inside a lot.
    Slot(SlotRef),
    /// Inside a lift bay.
    Bay(LiftId),
    /// The carpark entrance, outside every bay.
    Entrance,
}

/// Why a migration ended without committing.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MigrationOutcome {
    /// Relocated to the target level.
    Committed(SlotRef),
    /// Cancelled and unwound; the vehicle is back in its original lot.
    RolledBack { marker: u8, slot: SlotRef },
}

impl MigrationOutcome {
    /// Where the vehicle rests afterwards.
    pub fn slot(&self) -> SlotRef {
        match *self {
            MigrationOutcome::Committed(slot) => slot,
            MigrationOutcome::RolledBack { slot, .. } => slot,
        }
    }
}

/// Stage names are `&'static str`, so events serialize but do not
/// deserialize.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SimEvent {
    /// An entity starts moving; it arrives at `to` after `duration`.
    Motion {
        entity:   EntityRef,
        from:     Position,
        to:       Position,
        start:    SimTime,
        duration: SimDuration,
    },
    /// One named stage of a vehicle's workflow.
    Stage {
        vehicle: VehicleId,
        name:    &'static str,
        start:   SimTime,
        end:     SimTime,
    },
    Arrived {
        vehicle: VehicleId,
        at:      SimTime,
    },
    /// Park committed.  `wait` runs from arrival, `service` from the end of
    /// drive-in.
    Parked {
        vehicle: VehicleId,
        slot:    SlotRef,
        at:      SimTime,
        wait:    SimDuration,
        service: SimDuration,
    },
    /// Exit released the lot.  `service` runs from the start of the vehicle
    /// transfer out of the lot.
    Released {
        vehicle: VehicleId,
        slot:    SlotRef,
        at:      SimTime,
        service: SimDuration,
    },
    /// Drive-off complete.  `wait` runs from the retrieval request.
    Exited {
        vehicle: VehicleId,
        at:      SimTime,
        wait:    SimDuration,
    },
    Migrated {
        vehicle: VehicleId,
        from:    SlotRef,
        to:      SlotRef,
        at:      SimTime,
    },
    MigrationRolledBack {
        vehicle: VehicleId,
        marker:  u8,
        slot:    SlotRef,
        at:      SimTime,
    },
    /// Per-level occupied/capacity snapshot.
    Occupancy {
        at:       SimTime,
        occupied: Vec<usize>,
        capacity: Vec<usize>,
    },
    /// A single vehicle's workflow was abandoned after compensation.
    Aborted {
        vehicle: VehicleId,
        at:      SimTime,
        reason:  String,
    },
}

impl SimEvent {
    /// Timestamp at which the event happened (start time for motions and
    /// stages).
    pub fn time(&self) -> SimTime {
        match self {
            SimEvent::Motion { start, .. } | SimEvent::Stage { start, .. } => *start,
            SimEvent::Arrived { at, .. }
            | SimEvent::Parked { at, .. }
            | SimEvent::Released { at, .. }
            | SimEvent::Exited { at, .. }
            | SimEvent::Migrated { at, .. }
            | SimEvent::MigrationRolledBack { at, .. }
            | SimEvent::Occupancy { at, .. }
            | SimEvent::Aborted { at, .. } => *at,
        }
    }
}
