//! Carpark layout and machinery configuration.
//!
//! Immutable for the duration of a run.  Geometry is expressed in lateral
//! slot coordinates (one coordinate step = one car width) and levels; speeds
//! in metres per minute.  Travel-time validation (non-positive speeds,
//! unreachable lots) happens when `mc-travel` builds its tables; the checks
//! here are purely structural.

use crate::{CoreError, CoreResult, LevelId};

/// Position and orientation requirement of one lot within a level.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LotGeometry {
    /// Lateral coordinate the shuttle must reach to serve this lot.
    pub lateral: u32,
    /// `true` if the vehicle needs a 180° turn on the rotary pallet
    /// (north-side lots face the opposite way to the lift bays).
    pub turn: bool,
}

/// Machinery speeds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Speeds {
    pub shuttle_m_per_min: f64,
    pub pallet_m_per_min:  f64,
    pub lift_m_per_min:    f64,
    pub rotary_rpm:        f64,
}

/// Ground-tier fast lane used by the Cache policy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LobbyConfig {
    /// Lateral bay position of each lobby unit.  One unit per entry.
    pub positions:      Vec<u32>,
    /// Slots withheld from the global slot permit.  Also the maximum number
    /// of concurrent ground-tier migrations.
    pub reserved_slots: u32,
}

/// Full layout/geometry configuration for one carpark.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarparkConfig {
    /// Number of levels; level 0 is the ground level.
    pub levels: u16,

    /// Lot layout shared by every level, indexed by `LotId`.
    pub lots: Vec<LotGeometry>,

    /// Optional per-level capacity.  Level `l` uses the first
    /// `level_capacity[l]` entries of `lots`.  `None` means every level uses
    /// the full layout.
    pub level_capacity: Option<Vec<u16>>,

    /// Highest reachable lateral coordinate on the shuttle track.
    pub track_length: u32,

    /// Lateral bay position of each lift.  One lift per entry.
    pub lift_positions: Vec<u32>,

    /// Level every lift starts at.
    pub default_lift_level: u16,

    pub shuttles_per_level: u16,

    /// Lateral position an idle shuttle returns to.
    pub shuttle_home: u32,

    pub car_width_m:    f64,
    pub level_height_m: f64,
    pub speeds:         Speeds,

    /// Uniform range (minutes) for the driver to drive in or out of a lift.
    pub drive_in_out_min: (f64, f64),

    /// Lobby fast lane; only consulted under the Cache policy.
    pub lobby: Option<LobbyConfig>,
}

impl CarparkConfig {
    /// The two-level, 39-lots-per-level mechanised carpark from the Changi
    /// study: four lifts, one shuttle per level.
    pub fn changi() -> Self {
        let mut lots = Vec::with_capacity(39);
        // North side: lots face away from the bays and need a turn.
        for lateral in 1..=26 {
            lots.push(LotGeometry { lateral, turn: true });
        }
        // South-west bay.
        for lateral in 1..=7 {
            lots.push(LotGeometry { lateral, turn: false });
        }
        // South-east bay.
        for lateral in 20..=25 {
            lots.push(LotGeometry { lateral, turn: false });
        }

        Self {
            levels:             2,
            lots,
            level_capacity:     None,
            track_length:       26,
            lift_positions:     vec![9, 12, 15, 18],
            default_lift_level: 0,
            shuttles_per_level: 1,
            shuttle_home:       13,
            car_width_m:        2.4,
            level_height_m:     2.5,
            speeds: Speeds {
                shuttle_m_per_min: 90.0,
                pallet_m_per_min:  45.0,
                lift_m_per_min:    65.0,
                rotary_rpm:        3.5,
            },
            drive_in_out_min: (1.0 / 6.0, 0.51),
            lobby:            None,
        }
    }

    /// `changi()` with a small ground cache tier and one lobby unit.
    pub fn changi_cache() -> Self {
        Self {
            levels:         3,
            level_capacity: Some(vec![6, 39, 39]),
            lobby: Some(LobbyConfig { positions: vec![13], reserved_slots: 3 }),
            ..Self::changi()
        }
    }

    /// Number of usable lots on `level`.
    pub fn capacity(&self, level: LevelId) -> usize {
        match &self.level_capacity {
            Some(caps) => caps
                .get(level.index())
                .map_or(0, |&c| (c as usize).min(self.lots.len())),
            None => self.lots.len(),
        }
    }

    /// Sum of all level capacities.
    pub fn total_slots(&self) -> usize {
        (0..self.levels).map(|l| self.capacity(LevelId(l))).sum()
    }

    /// Slots withheld from the global slot permit.  Only a lobby that is in
    /// use reserves anything.
    pub fn reserved_slots(&self, lobby_in_use: bool) -> usize {
        match (&self.lobby, lobby_in_use) {
            (Some(l), true) => l.reserved_slots as usize,
            _ => 0,
        }
    }

    /// Capacity of the global slot permit: total slots minus
    /// [`reserved_slots`](Self::reserved_slots).
    pub fn slot_permit_capacity(&self, lobby_in_use: bool) -> usize {
        self.total_slots().saturating_sub(self.reserved_slots(lobby_in_use))
    }

    /// Structural validation.  Speed and reachability checks live in
    /// `mc-travel`.
    pub fn validate(&self) -> CoreResult<()> {
        if self.levels == 0 {
            return Err(CoreError::Config("carpark must have at least one level".into()));
        }
        if self.lots.is_empty() {
            return Err(CoreError::Config("lot layout is empty".into()));
        }
        if self.lots.len() > u16::MAX as usize {
            return Err(CoreError::IdOverflow { what: "lot", got: self.lots.len() });
        }
        if self.lift_positions.is_empty() {
            return Err(CoreError::Config("at least one lift is required".into()));
        }
        if self.lift_positions.len() > u16::MAX as usize {
            return Err(CoreError::IdOverflow { what: "lift", got: self.lift_positions.len() });
        }
        if self.default_lift_level >= self.levels {
            return Err(CoreError::Config(format!(
                "default lift level {} is outside 0..{}",
                self.default_lift_level, self.levels
            )));
        }
        if let Some(caps) = &self.level_capacity {
            if caps.len() != self.levels as usize {
                return Err(CoreError::Config(format!(
                    "level_capacity has {} entries for {} levels",
                    caps.len(),
                    self.levels
                )));
            }
        }
        if self.total_slots() == 0 {
            return Err(CoreError::Config("carpark has no usable lots".into()));
        }
        let (lo, hi) = self.drive_in_out_min;
        if !(lo >= 0.0 && hi >= lo) {
            return Err(CoreError::Config(format!(
                "drive in/out range ({lo}, {hi}) must satisfy 0 <= lo <= hi"
            )));
        }
        if let Some(lobby) = &self.lobby {
            if lobby.reserved_slots as usize >= self.total_slots() {
                return Err(CoreError::Config(format!(
                    "lobby reserves {} of {} slots",
                    lobby.reserved_slots,
                    self.total_slots()
                )));
            }
        }
        Ok(())
    }
}
