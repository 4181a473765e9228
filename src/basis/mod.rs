//! Kets and bases of single atoms and of atom pairs.

use std::fmt;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

pub mod atom;
pub mod ket;
pub mod pair;
pub mod sparse;

/// An enumerated type for the spatial parity of a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    /// Variant for states that are symmetric under spatial inversion.
    Even,

    /// Variant for states that are antisymmetric under spatial inversion.
    Odd,

    /// Variant for states without a defined parity.
    Unknown,
}

impl Parity {
    /// Returns the parity $`(-1)^l`$ of an orbital angular momentum.
    pub fn from_l(l: i32) -> Self {
        if l.rem_euclid(2) == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// Returns `true` unless the parity is [`Parity::Unknown`].
    pub fn is_defined(&self) -> bool {
        !matches!(self, Parity::Unknown)
    }
}

impl Default for Parity {
    fn default() -> Self {
        Parity::Unknown
    }
}

impl Mul for Parity {
    type Output = Parity;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Parity::Unknown, _) | (_, Parity::Unknown) => Parity::Unknown,
            (a, b) if a == b => Parity::Even,
            _ => Parity::Odd,
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "even"),
            Parity::Odd => write!(f, "odd"),
            Parity::Unknown => write!(f, "unknown"),
        }
    }
}
