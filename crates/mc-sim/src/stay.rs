//! Stay-duration samplers: how long a vehicle stays parked before its driver
//! calls for it.

use mc_core::{SimDuration, SimRng};
use rand::Rng;
use rand_distr::{Exp, Weibull};

use crate::{SimError, SimResult};

/// Weibull shape fitted to the Changi occupancy survey.
pub const SURVEY_WEIBULL_SHAPE: f64 = 1.359;
/// Weibull scale fitted to the Changi survey, in minutes (3.68 hours).
pub const SURVEY_WEIBULL_SCALE_MIN: f64 = 3.68 * 60.0;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StaySampler {
    /// Exponential with the given mean, in minutes.
    Exponential { mean_min: f64 },
    /// Weibull with shape `k` and scale `λ` in minutes.
    Weibull { shape: f64, scale_min: f64 },
    /// Every vehicle stays exactly this long.
    Fixed(SimDuration),
}

impl Default for StaySampler {
    /// Exponential with a 100-minute mean (a retrieval rate of 0.01 per
    /// minute).
    fn default() -> Self {
        StaySampler::Exponential { mean_min: 100.0 }
    }
}

impl StaySampler {
    pub fn survey_weibull() -> Self {
        StaySampler::Weibull { shape: SURVEY_WEIBULL_SHAPE, scale_min: SURVEY_WEIBULL_SCALE_MIN }
    }

    /// Check the parameters once so [`StaySampler::sample`] cannot fail.
    pub fn validate(&self) -> SimResult<()> {
        match *self {
            StaySampler::Exponential { mean_min } => {
                if !(mean_min.is_finite() && mean_min > 0.0) {
                    return Err(SimError::Config(format!("exponential stay mean {mean_min} must be positive")));
                }
                Exp::new(1.0 / mean_min).map_err(|e| SimError::Config(e.to_string()))?;
            }
            StaySampler::Weibull { shape, scale_min } => {
                Weibull::new(scale_min, shape).map_err(|e| SimError::Config(e.to_string()))?;
            }
            StaySampler::Fixed(_) => {}
        }
        Ok(())
    }

    /// Draw one stay.  Invalid parameters yield a zero stay; call
    /// [`StaySampler::validate`] first.
    pub fn sample(&self, rng: &mut SimRng) -> SimDuration {
        let minutes = match *self {
            StaySampler::Exponential { mean_min } => match Exp::new(1.0 / mean_min) {
                Ok(d) => rng.inner().sample(d),
                Err(_) => 0.0,
            },
            StaySampler::Weibull { shape, scale_min } => match Weibull::new(scale_min, shape) {
                Ok(d) => rng.inner().sample(d),
                Err(_) => 0.0,
            },
            StaySampler::Fixed(d) => return d,
        };
        SimDuration::from_minutes(minutes)
    }
}
