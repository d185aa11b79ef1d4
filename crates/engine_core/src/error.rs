//! Errors raised when constructing core types from untrusted values.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid pitch limits: min {min} must not exceed max {max}")]
    InvalidPitchLimits { min: f32, max: f32 },

    #[error("invalid hit capsule: radius {radius} and half height {half_height} must be positive")]
    InvalidCapsule { radius: f32, half_height: f32 },
}
