//! Travel-model error type.

use thiserror::Error;

use mc_core::{CoreError, LotId};

/// Layout problems detected while building travel tables.  All of them are
/// fatal for a run and surface before the first vehicle arrives.
#[derive(Debug, Error)]
pub enum TravelError {
    #[error("{what} must be positive and finite, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    #[error("{lot} at lateral {lateral} is beyond the shuttle track (length {track_length})")]
    UnreachableLot {
        lot:          LotId,
        lateral:      u32,
        track_length: u32,
    },

    #[error("{what} {index} at lateral {lateral} is off the shuttle track (length {track_length})")]
    OffTrack {
        what:         &'static str,
        index:        usize,
        lateral:      u32,
        track_length: u32,
    },

    #[error("lot layout is empty")]
    EmptyLayout,

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type TravelResult<T> = Result<T, TravelError>;
