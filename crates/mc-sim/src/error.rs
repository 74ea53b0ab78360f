use mc_carpark::CarparkError;
use mc_core::CoreError;
use mc_travel::TravelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("layout error: {0}")]
    Layout(#[from] CoreError),

    #[error("travel model error: {0}")]
    Travel(#[from] TravelError),

    #[error("carpark error: {0}")]
    Carpark(#[from] CarparkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrival CSV parse error: {0}")]
    Parse(String),
}

pub type SimResult<T> = Result<T, SimError>;
