//! Per-lift travel-time tables.
//!
//! A table is built once per lift (and per lobby unit) at startup and is
//! read-only afterwards.  All levels share one lot layout, so a single table
//! covers every level; a level with reduced capacity just consults a prefix.
//! Construction is deterministic: two lifts at the same lateral position
//! produce identical tables.

use mc_core::{CarparkConfig, LiftId, LotGeometry, LotId};

use crate::{StageTimes, TravelError, TravelParams, TravelResult};

/// Stage durations from one bay to every lot, indexed by `LotId`.
#[derive(Clone, Debug, PartialEq)]
pub struct TravelTable {
    origin: u32,
    times:  Vec<StageTimes>,
}

impl TravelTable {
    pub fn build(params: &TravelParams, origin: u32, lots: &[LotGeometry]) -> Self {
        let times = lots.iter().map(|lot| params.stage_times(origin, lot)).collect();
        Self { origin, times }
    }

    /// Lateral position of the bay this table was built for.
    pub fn origin(&self) -> u32 {
        self.origin
    }

    #[inline]
    pub fn get(&self, lot: LotId) -> Option<&StageTimes> {
        self.times.get(lot.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LotId, &StageTimes)> {
        self.times.iter().enumerate().map(|(i, t)| (LotId(i as u16), t))
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The candidate with the smallest total travel time.  Ties go to the
    /// candidate yielded first.  Unknown lots are skipped.
    pub fn nearest(&self, candidates: impl IntoIterator<Item = LotId>) -> Option<LotId> {
        candidates
            .into_iter()
            .filter_map(|lot| self.get(lot).map(|t| (lot, t.total)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(lot, _)| lot)
    }
}

/// Validated parameters plus one table per lift and per lobby unit.
#[derive(Clone, Debug)]
pub struct TravelModel {
    params: TravelParams,
    lifts:  Vec<TravelTable>,
    lobby:  Vec<TravelTable>,
}

fn on_track(what: &'static str, index: usize, lateral: u32, track_length: u32) -> TravelResult<()> {
    if lateral > track_length {
        return Err(TravelError::OffTrack { what, index, lateral, track_length });
    }
    Ok(())
}

impl TravelModel {
    /// Validate `cfg` and build every table.  Fails fast on the first
    /// malformed entry.
    pub fn build(cfg: &CarparkConfig) -> TravelResult<Self> {
        if cfg.lots.is_empty() {
            return Err(TravelError::EmptyLayout);
        }
        cfg.validate()?;
        let params = TravelParams::from_config(cfg)?;

        let track_length = cfg.track_length;
        for (i, lot) in cfg.lots.iter().enumerate() {
            if lot.lateral > track_length {
                return Err(TravelError::UnreachableLot {
                    lot: LotId(i as u16),
                    lateral: lot.lateral,
                    track_length,
                });
            }
        }
        for (i, &pos) in cfg.lift_positions.iter().enumerate() {
            on_track("lift", i, pos, track_length)?;
        }
        let lobby_positions = cfg.lobby.as_ref().map_or(&[][..], |l| &l.positions[..]);
        for (i, &pos) in lobby_positions.iter().enumerate() {
            on_track("lobby unit", i, pos, track_length)?;
        }
        on_track("shuttle home", 0, cfg.shuttle_home, track_length)?;

        let lifts = cfg
            .lift_positions
            .iter()
            .map(|&pos| TravelTable::build(&params, pos, &cfg.lots))
            .collect();
        let lobby = lobby_positions
            .iter()
            .map(|&pos| TravelTable::build(&params, pos, &cfg.lots))
            .collect();

        Ok(Self { params, lifts, lobby })
    }

    pub fn params(&self) -> &TravelParams {
        &self.params
    }

    pub fn lift(&self, id: LiftId) -> Option<&TravelTable> {
        self.lifts.get(id.index())
    }

    pub fn lobby(&self, id: LiftId) -> Option<&TravelTable> {
        self.lobby.get(id.index())
    }

    pub fn lift_count(&self) -> usize {
        self.lifts.len()
    }

    pub fn lobby_count(&self) -> usize {
        self.lobby.len()
    }
}
