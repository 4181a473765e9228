//! Auxiliary numeric definitions.

pub mod scalar;

/// Numerical precision used when comparing quantum numbers and discarding vanishing matrix
/// elements.
pub const NUMERICAL_PRECISION: f64 = 100.0 * f64::EPSILON;
