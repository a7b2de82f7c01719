//! Error types for wheel configuration and spin requests.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("wheel needs at least one segment")]
    NoSegments,
    #[error("{weights} segment weights given for {segments} segments")]
    WeightCountMismatch { weights: usize, segments: usize },
    #[error("weight of segment {index} must be positive and finite, got {weight}")]
    InvalidWeight { index: usize, weight: f64 },
    #[error("spin duration must be positive, got {0}")]
    NonPositiveDuration(f64),
    #[error("turn counts must be positive, got {min}..={max}")]
    NonPositiveTurns { min: f64, max: f64 },
    #[error("minimum turns {min} exceed maximum turns {max}")]
    InvertedTurns { min: f64, max: f64 },
    #[error("result hold time must not be negative, got {0}")]
    NegativeResultHold(f64),
    #[error("frame rate must be positive, got {0}")]
    NonPositiveFramerate(f64),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpinError {
    #[error("wheel is already spinning")]
    Busy,
    #[error("target segment {index} out of range for {count} segments")]
    TargetOutOfRange { index: usize, count: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
