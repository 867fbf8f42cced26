use thiserror::Error;

/// Errors from constructing model objects with invalid parameters.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("exponential rate must be non-negative, got {0}")]
    InvalidRate(f64),

    #[error("invalid gamma parameters: shape {shape}, scale {scale}")]
    InvalidGamma { shape: f64, scale: f64 },
}

pub type ModelResult<T> = Result<T, ModelError>;
