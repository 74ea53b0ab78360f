//! Placement policies.
//!
//! A policy is fixed for a run.  Level selection is the only branch point
//! before resource acquisition; lot selection happens once the vehicle has
//! reached the chosen level.
//!
//! | Policy         | Level                                          | Lot            |
//! |----------------|------------------------------------------------|----------------|
//! | `NearestFirst` | lowest level with a free slot and idle shuttle | shortest total |
//! | `Randomised`   | uniform among levels with a free slot          | uniform        |
//! | `Balanced`     | fewest occupied among levels with a free slot  | shortest total |
//! | `Cache`        | ground first, else round-robin over the rest   | shortest total |
//!
//! The selectors below are pure functions of the level states.  `None`
//! means "nothing acceptable right now"; the controller then waits for the
//! next state change and asks again.

use std::fmt;
use std::str::FromStr;

use mc_core::{LevelId, LotId, SimRng};
use mc_travel::TravelTable;

use crate::LevelState;

/// Level index of the ground (cache) tier.
pub const GROUND: LevelId = LevelId(0);

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Policy {
    NearestFirst,
    Randomised,
    Balanced,
    Cache,
}

impl Policy {
    pub const ALL: [Policy; 4] =
        [Policy::NearestFirst, Policy::Randomised, Policy::Balanced, Policy::Cache];

    pub fn name(self) -> &'static str {
        match self {
            Policy::NearestFirst => "nearest-first",
            Policy::Randomised   => "randomised",
            Policy::Balanced     => "balanced",
            Policy::Cache        => "cache",
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        Policy::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown policy {s:?}"))
    }
}

// ── Level selection ───────────────────────────────────────────────────────────

fn level_id(index: usize) -> LevelId {
    LevelId(index as u16)
}

/// Lowest level with both a free slot and an idle shuttle.
pub fn nearest_first(levels: &[LevelState], shuttle_idle: impl Fn(LevelId) -> bool) -> Option<LevelId> {
    levels
        .iter()
        .enumerate()
        .map(|(i, l)| (level_id(i), l))
        .find(|(id, l)| l.free > 0 && shuttle_idle(*id))
        .map(|(id, _)| id)
}

/// Uniformly random level among those with a free slot, by rejection
/// sampling over all levels.
pub fn randomised(levels: &[LevelState], rng: &mut SimRng) -> Option<LevelId> {
    if !levels.iter().any(|l| l.free > 0) {
        return None;
    }
    loop {
        let i = rng.gen_range(0..levels.len());
        if levels[i].free > 0 {
            return Some(level_id(i));
        }
    }
}

/// Level with the fewest occupied lots among those with a free slot.  Ties
/// go to the lowest index.
pub fn balanced(levels: &[LevelState]) -> Option<LevelId> {
    levels
        .iter()
        .enumerate()
        .filter(|(_, l)| l.free > 0)
        .min_by_key(|(i, l)| (l.occupied.len(), *i))
        .map(|(i, _)| level_id(i))
}

/// Ground tier if it has a free slot and an idle shuttle.  Otherwise the
/// first acceptable non-ground level after `last`, wrapping around.
pub fn cache(
    levels:       &[LevelState],
    shuttle_idle: impl Fn(LevelId) -> bool,
    last:         LevelId,
) -> Option<LevelId> {
    let accepts = |i: usize| levels[i].free > 0 && shuttle_idle(level_id(i));
    if levels.is_empty() {
        return None;
    }
    if accepts(GROUND.index()) {
        return Some(GROUND);
    }
    let upper = levels.len() - 1;
    if upper == 0 {
        return None;
    }
    // Non-ground levels are 1..=upper; start just after `last`.
    let start = last.index().clamp(1, upper);
    (1..=upper)
        .map(|k| (start - 1 + k) % upper + 1)
        .find(|&i| accepts(i))
        .map(level_id)
}

// ── Lot selection ─────────────────────────────────────────────────────────────

/// Unoccupied lot with the shortest total travel time from `table`'s bay.
pub fn nearest_lot(level: &LevelState, table: &TravelTable) -> Option<LotId> {
    table.nearest(level.unoccupied())
}

/// Uniformly random unoccupied lot.
pub fn random_lot(level: &LevelState, rng: &mut SimRng) -> Option<LotId> {
    let free: Vec<LotId> = level.unoccupied().collect();
    rng.choose(&free).copied()
}
