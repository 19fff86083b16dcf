/// Validation errors for geometry and body tunables.
///
/// These are programmer/config errors: they are raised at the point of
/// construction or mutation and the offending value is never stored.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("rectangle size must be positive, got {w}x{h}")]
    NonPositiveSize { w: i32, h: i32 },

    #[error("{name} must be non-negative, got {value}")]
    NegativeSpeed { name: &'static str, value: i32 },

    #[error("{name} must be a finite value greater than zero, got {value}")]
    NonPositiveTunable { name: &'static str, value: f64 },

    #[error("{name} must be at most {max} px per frame, got {value}")]
    SpeedTooLarge { name: &'static str, value: f64, max: f64 },

    #[error("unknown color name {0:?} (expected red, green, blue, white, black or yellow)")]
    UnknownColor(String),
}
