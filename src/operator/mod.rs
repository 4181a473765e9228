//! Tags of atom-local operators and the rules for combining two of them into a pair operator.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::Dimension;

// ================
// Error definition
// ================

/// Error for operators, or operator components, for which no matrix can be provided.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedOperatorError(pub String);

impl fmt::Display for UnsupportedOperatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unsupported operator: {}", self.0)
    }
}

impl Error for UnsupportedOperatorError {}

// =================
// Enum definition
// =================

/// An enumerated type for the atom-local operators whose matrix elements can be queried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorType {
    /// The zero operator.
    Zero,

    /// The identity operator.
    Identity,

    /// The unperturbed Hamiltonian.
    Energy,

    /// The spherical components of the electric dipole operator.
    ElectricDipole,

    /// The spherical components of the electric quadrupole operator.
    ElectricQuadrupole,

    /// The rotationally invariant part of the electric quadrupole operator.
    ElectricQuadrupoleZero,

    /// The spherical components of the electric octupole operator.
    ElectricOctupole,

    /// The spherical components of the magnetic dipole operator.
    MagneticDipole,

    /// The spherical components of the diamagnetic operator.
    Diamagnetic,

    /// An operator with no known tensor structure.
    Arbitrary,
}

impl OperatorType {
    /// Returns the spherical-tensor rank of the operator, or `None` if it has none.
    pub fn rank(&self) -> Option<u32> {
        match self {
            OperatorType::Zero
            | OperatorType::Identity
            | OperatorType::Energy
            | OperatorType::ElectricQuadrupoleZero => Some(0),
            OperatorType::ElectricDipole | OperatorType::MagneticDipole => Some(1),
            OperatorType::ElectricQuadrupole | OperatorType::Diamagnetic => Some(2),
            OperatorType::ElectricOctupole => Some(3),
            OperatorType::Arbitrary => None,
        }
    }

    /// Returns the physical dimension of the operator's matrix elements, or `None` if they are
    /// dimensionless or of unknown dimension.
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            OperatorType::Zero | OperatorType::Identity | OperatorType::Arbitrary => None,
            OperatorType::Energy => Some(Dimension::Energy),
            OperatorType::ElectricDipole => Some(Dimension::ElectricDipole),
            OperatorType::ElectricQuadrupole | OperatorType::ElectricQuadrupoleZero => {
                Some(Dimension::ElectricQuadrupole)
            }
            OperatorType::ElectricOctupole => Some(Dimension::ElectricOctupole),
            OperatorType::MagneticDipole => Some(Dimension::MagneticDipole),
            OperatorType::Diamagnetic => Some(Dimension::Diamagnetic),
        }
    }

    /// Checks that `q` is a valid spherical component of this operator.
    ///
    /// # Errors
    ///
    /// Errors with [`UnsupportedOperatorError`] if the operator has no tensor structure or if
    /// $`|q|`$ exceeds its rank.
    pub fn check_component(&self, q: i32) -> Result<(), UnsupportedOperatorError> {
        let rank = self.rank().ok_or_else(|| {
            UnsupportedOperatorError(format!("`{self}` has no composite rule"))
        })?;
        if q.unsigned_abs() > rank {
            Err(UnsupportedOperatorError(format!(
                "component q = {q} exceeds the rank {rank} of `{self}`"
            )))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for OperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorType::Zero => "zero",
            OperatorType::Identity => "identity",
            OperatorType::Energy => "energy",
            OperatorType::ElectricDipole => "electric dipole",
            OperatorType::ElectricQuadrupole => "electric quadrupole",
            OperatorType::ElectricQuadrupoleZero => "electric quadrupole (invariant part)",
            OperatorType::ElectricOctupole => "electric octupole",
            OperatorType::MagneticDipole => "magnetic dipole",
            OperatorType::Diamagnetic => "diamagnetic",
            OperatorType::Arbitrary => "arbitrary",
        };
        write!(f, "{name}")
    }
}

/// Checks that a pair of operators and their components form a valid pair operator and returns
/// the physical dimensions of the product.
///
/// # Errors
///
/// Errors with [`UnsupportedOperatorError`] if either component is invalid.
pub fn check_composite(
    operators: (OperatorType, OperatorType),
    qs: (i32, i32),
) -> Result<Vec<Dimension>, UnsupportedOperatorError> {
    operators.0.check_component(qs.0)?;
    operators.1.check_component(qs.1)?;
    Ok([operators.0.dimension(), operators.1.dimension()]
        .into_iter()
        .flatten()
        .collect())
}
