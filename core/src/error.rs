use thiserror::Error;

#[derive(Debug, Error)]
pub enum KcsError {
    #[error("bit rate calibration failed: no qualifying zero crossings in input")]
    CalibrationFailure,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, KcsError>;
