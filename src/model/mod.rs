//! Validated models of the quantities that configure a pair-interaction calculation.

use std::error::Error;
use std::fmt;

pub mod atom;
pub mod parameter;
pub mod state;

/// Error for nested descriptors whose species disagrees with that of their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesMismatchError(pub String);

impl fmt::Display for SpeciesMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Species mismatch: {}", self.0)
    }
}

impl Error for SpeciesMismatchError {}

/// Returns `true` if `value` is an integer or a half-integer.
pub(crate) fn is_half_integer(value: f64) -> bool {
    let twice = 2.0 * value;
    (twice - twice.round()).abs() < 1e-9
}

/// Returns `true` if `value` is an integer.
pub(crate) fn is_integer(value: f64) -> bool {
    (value - value.round()).abs() < 1e-9
}
