//! Stage durations for one transport leg.
//!
//! # Cost units
//!
//! Speeds are metres per minute, so every formula yields minutes:
//!
//! | Stage         | Minutes                                       |
//! |---------------|-----------------------------------------------|
//! | `LiftPallet`  | `car_width / pallet_speed`                    |
//! | `OriginLot`   | `car_width * |origin - lateral| / shuttle_speed` |
//! | `Turning`     | `180 / (rotary_rpm * 360)`, lots that turn only |
//! | `PalletLot`   | `car_width / pallet_speed`                    |
//!
//! Each component is rounded to two decimals and `total` is the rounded sum
//! of the rounded components.  Vertical and repositioning moves are not
//! rounded beyond millisecond precision.

use mc_core::{CarparkConfig, LevelId, LotGeometry, SimDuration, round2};

use crate::{TravelError, TravelResult};

/// The four transport stages between a lift bay and a lot, in park order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Stage {
    LiftPallet,
    OriginLot,
    Turning,
    PalletLot,
}

impl Stage {
    /// Park order.  Retrieval runs the same stages in reverse.
    pub const PARK_ORDER: [Stage; 4] =
        [Stage::LiftPallet, Stage::OriginLot, Stage::Turning, Stage::PalletLot];

    pub fn name(self) -> &'static str {
        match self {
            Stage::LiftPallet => "lift_pallet",
            Stage::OriginLot  => "origin_lot",
            Stage::Turning    => "turning",
            Stage::PalletLot  => "pallet_lot",
        }
    }
}

/// Stage durations in minutes from one origin to one lot.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StageTimes {
    pub lift_pallet: f64,
    pub origin_lot:  f64,
    pub turning:     f64,
    pub pallet_lot:  f64,
    pub total:       f64,
}

impl StageTimes {
    pub fn minutes(&self, stage: Stage) -> f64 {
        match stage {
            Stage::LiftPallet => self.lift_pallet,
            Stage::OriginLot  => self.origin_lot,
            Stage::Turning    => self.turning,
            Stage::PalletLot  => self.pallet_lot,
        }
    }

    #[inline]
    pub fn duration(&self, stage: Stage) -> SimDuration {
        SimDuration::from_minutes(self.minutes(stage))
    }

    #[inline]
    pub fn total_duration(&self) -> SimDuration {
        SimDuration::from_minutes(self.total)
    }

    /// Total without the turn; retrieval lift choice ranks on this.
    #[inline]
    pub fn total_without_turn(&self) -> f64 {
        round2(self.total - self.turning)
    }
}

/// Validated speeds and geometry.
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TravelParams {
    pub car_width_m:    f64,
    pub level_height_m: f64,
    pub shuttle_speed:  f64,
    pub pallet_speed:   f64,
    pub lift_speed:     f64,
    pub rotary_rpm:     f64,
}

fn positive(what: &'static str, value: f64) -> TravelResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TravelError::NonPositive { what, value })
    }
}

impl TravelParams {
    pub fn from_config(cfg: &CarparkConfig) -> TravelResult<Self> {
        let level_height_m = cfg.level_height_m;
        if !(level_height_m.is_finite() && level_height_m >= 0.0) {
            return Err(TravelError::NonPositive { what: "level height", value: level_height_m });
        }
        Ok(Self {
            car_width_m:   positive("car width", cfg.car_width_m)?,
            level_height_m,
            shuttle_speed: positive("shuttle speed", cfg.speeds.shuttle_m_per_min)?,
            pallet_speed:  positive("pallet speed", cfg.speeds.pallet_m_per_min)?,
            lift_speed:    positive("lift speed", cfg.speeds.lift_m_per_min)?,
            rotary_rpm:    positive("rotary speed", cfg.speeds.rotary_rpm)?,
        })
    }

    /// Stage durations from a bay at lateral `origin` to `lot`.
    pub fn stage_times(&self, origin: u32, lot: &LotGeometry) -> StageTimes {
        let pallet = round2(self.car_width_m / self.pallet_speed);
        let lateral = round2(self.car_width_m * origin.abs_diff(lot.lateral) as f64 / self.shuttle_speed);
        let turning = if lot.turn { round2(180.0 / (self.rotary_rpm * 360.0)) } else { 0.0 };
        StageTimes {
            lift_pallet: pallet,
            origin_lot:  lateral,
            turning,
            pallet_lot:  pallet,
            total:       round2(pallet + lateral + turning + pallet),
        }
    }

    /// Vertical lift travel between two levels.
    pub fn lift_travel(&self, from: LevelId, to: LevelId) -> SimDuration {
        let levels = from.0.abs_diff(to.0) as f64;
        SimDuration::from_minutes(levels * self.level_height_m / self.lift_speed)
    }

    /// Empty shuttle repositioning between two lateral positions.
    pub fn shuttle_travel(&self, from: u32, to: u32) -> SimDuration {
        SimDuration::from_minutes(self.car_width_m * from.abs_diff(to) as f64 / self.shuttle_speed)
    }
}
