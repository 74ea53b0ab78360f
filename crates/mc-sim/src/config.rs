//! Run-level settings, separate from the carpark layout.

use mc_core::{SimDuration, SimTime};

use crate::{SimError, SimResult};

/// Occupancy sampling interval used by the Changi study.
pub const DEFAULT_SAMPLE_INTERVAL: SimDuration = SimDuration(5 * 60 * 1000);

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Master seed.  Arrival offsets, stays and controller randomness draw
    /// from independent child streams of it.
    pub seed: u64,

    /// Stop once the next pending event is later than this.  `None` runs
    /// until every admitted vehicle has left.
    pub horizon: Option<SimTime>,

    /// Time between occupancy samples.
    pub sample_interval: SimDuration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self { seed: 12_345, horizon: None, sample_interval: DEFAULT_SAMPLE_INTERVAL }
    }
}

impl SimConfig {
    pub fn validate(&self) -> SimResult<()> {
        if self.sample_interval.is_zero() {
            return Err(SimError::Config("sample interval must be positive".into()));
        }
        Ok(())
    }
}
