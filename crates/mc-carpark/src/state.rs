//! Per-level occupancy bookkeeping.
//!
//! # Counting model
//!
//! ```text
//! free + reserved + |occupied| == capacity        (always)
//! reserved == 0                                   (whenever no workflow is mid-park)
//! ```
//!
//! `reserve` moves one unit from `free` to `reserved` when a policy commits a
//! vehicle to a level; `claim` turns the reservation into a concrete lot once
//! the vehicle reaches the level.  Every method leaves the identity intact,
//! and none of them can be interrupted because none of them suspends.

use std::collections::BTreeSet;

use mc_core::{CarparkConfig, LevelId, LotId};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelState {
    pub capacity: usize,
    pub free:     usize,
    pub reserved: usize,
    pub occupied: BTreeSet<LotId>,
}

impl LevelState {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, free: capacity, reserved: 0, occupied: BTreeSet::new() }
    }

    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.free + self.reserved + self.occupied.len() == self.capacity
    }

    /// Fraction of lots occupied.
    pub fn occupancy_ratio(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.occupied.len() as f64 / self.capacity as f64
    }

    /// Lots in `0..capacity` that are not occupied, ascending.
    pub fn unoccupied(&self) -> impl Iterator<Item = LotId> + '_ {
        (0..self.capacity as u16).map(LotId).filter(|lot| !self.occupied.contains(lot))
    }
}

/// Occupancy of every level.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarparkState {
    pub levels: Vec<LevelState>,
}

impl CarparkState {
    pub fn new(config: &CarparkConfig) -> Self {
        let levels = (0..config.levels)
            .map(|l| LevelState::new(config.capacity(LevelId(l))))
            .collect();
        Self { levels }
    }

    pub fn level(&self, level: LevelId) -> Option<&LevelState> {
        self.levels.get(level.index())
    }

    /// Move one unit of `level` from free to reserved.  Returns `false` if
    /// the level has no free capacity.
    pub fn reserve(&mut self, level: LevelId) -> bool {
        match self.levels.get_mut(level.index()) {
            Some(l) if l.free > 0 => {
                l.free -= 1;
                l.reserved += 1;
                true
            }
            _ => false,
        }
    }

    /// Give back a reservation that was never claimed.
    pub fn cancel_reservation(&mut self, level: LevelId) -> bool {
        match self.levels.get_mut(level.index()) {
            Some(l) if l.reserved > 0 => {
                l.reserved -= 1;
                l.free += 1;
                true
            }
            _ => false,
        }
    }

    /// Turn a reservation into occupancy of `lot`.
    pub fn claim(&mut self, level: LevelId, lot: LotId) -> bool {
        match self.levels.get_mut(level.index()) {
            Some(l) if l.reserved > 0 && lot.index() < l.capacity && !l.occupied.contains(&lot) => {
                l.reserved -= 1;
                l.occupied.insert(lot);
                true
            }
            _ => false,
        }
    }

    /// Free an occupied lot.
    pub fn release(&mut self, level: LevelId, lot: LotId) -> bool {
        match self.levels.get_mut(level.index()) {
            Some(l) if l.occupied.contains(&lot) => {
                l.occupied.remove(&lot);
                l.free += 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.levels.iter().all(LevelState::is_consistent)
    }

    /// Consistent and no reservation outstanding.
    pub fn is_quiescent(&self) -> bool {
        self.levels.iter().all(|l| l.is_consistent() && l.reserved == 0)
    }

    pub fn total_occupied(&self) -> usize {
        self.levels.iter().map(|l| l.occupied.len()).sum()
    }
}
