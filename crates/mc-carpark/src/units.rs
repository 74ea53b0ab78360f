//! Transport units.  Each unit is a plain value that lives either in its
//! pool (idle) or in the workflow holding it, so exclusive use is enforced
//! by ownership.

use std::rc::Rc;

use mc_core::{LevelId, LiftId, ShuttleId};
use mc_travel::TravelTable;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LiftKind {
    /// Shared vertical lift serving every level.
    Lift,
    /// Ground-fixed fast lane used by the Cache policy.  Never leaves
    /// level 0.
    Lobby,
}

/// A lift or lobby unit.
#[derive(Clone, Debug)]
pub struct Lift {
    pub id:      LiftId,
    pub kind:    LiftKind,
    /// Current level.  Only changes after a vertical move has elapsed.
    pub level:   LevelId,
    /// Lateral position of the bay this unit serves.
    pub lateral: u32,
    pub table:   Rc<TravelTable>,
}

impl Lift {
    pub fn is_lobby(&self) -> bool {
        self.kind == LiftKind::Lobby
    }
}

/// A per-level shuttle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shuttle {
    pub id:      ShuttleId,
    pub level:   LevelId,
    /// Current lateral position.
    pub lateral: u32,
}
