//! Scalar types over which atom systems and pair bases are defined.

use std::fmt;

use ndarray::{LinalgScalar, ScalarOperand};
use num_complex::{Complex, ComplexFloat};

/// Trait for the numeric field in which Hamiltonians, eigenvectors and coefficients are
/// expressed. Implemented for `f64` (real representation) and `Complex<f64>` (complex
/// representation). Energies and quantum numbers are always real and therefore `f64`.
pub trait PairScalar:
    ComplexFloat<Real = f64> + LinalgScalar + ScalarOperand + Send + Sync + fmt::Debug + 'static
{
    /// Boolean indicating if this scalar type can hold non-zero imaginary parts.
    const IS_COMPLEX: bool;

    /// Embeds a real number.
    fn from_real(re: f64) -> Self;

    /// Constructs a scalar from its real and imaginary parts, or `None` if the imaginary part is
    /// non-zero and cannot be represented.
    fn from_parts(re: f64, im: f64) -> Option<Self>;

    /// Returns the squared modulus.
    fn norm_sqr(&self) -> f64 {
        let a = self.abs();
        a * a
    }
}

impl PairScalar for f64 {
    const IS_COMPLEX: bool = false;

    fn from_real(re: f64) -> Self {
        re
    }

    fn from_parts(re: f64, im: f64) -> Option<Self> {
        if im == 0.0 {
            Some(re)
        } else {
            None
        }
    }

    fn norm_sqr(&self) -> f64 {
        self * self
    }
}

impl PairScalar for Complex<f64> {
    const IS_COMPLEX: bool = true;

    fn from_real(re: f64) -> Self {
        Complex::new(re, 0.0)
    }

    fn from_parts(re: f64, im: f64) -> Option<Self> {
        Some(Complex::new(re, im))
    }

    fn norm_sqr(&self) -> f64 {
        Complex::norm_sqr(self)
    }
}
