//! Conversion of physical quantities between user-facing units and atomic units, the base unit
//! system in which every numeric value is stored internally.

use std::error::Error;
use std::fmt;

use itertools::Itertools;
use ndarray::Array1;
use phf::phf_map;
use serde::{Deserialize, Serialize};

use crate::auxiliary::scalar::PairScalar;

#[cfg(test)]
#[path = "units_tests.rs"]
mod units_tests;

/// Name of the base unit, accepted for every dimension.
pub const BASE_UNIT: &str = "au";

/// Separator between the per-factor units of a composite quantity.
pub const COMPOSITE_UNIT_SEPARATOR: &str = " * ";

// The values give the size of one unit expressed in atomic units.

static ENERGY_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "hartree" => 1.0,
    "eV" => 1.0 / 27.211386245988,
    "meV" => 1.0e-3 / 27.211386245988,
    "Hz" => 1.0 / 6.579683920502e15,
    "kHz" => 1.0e3 / 6.579683920502e15,
    "MHz" => 1.0e6 / 6.579683920502e15,
    "GHz" => 1.0e9 / 6.579683920502e15,
    "1/cm" => 1.0 / 219474.6313632,
};

static ELECTRIC_FIELD_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "V/m" => 1.0 / 5.14220674763e11,
    "V/cm" => 1.0e2 / 5.14220674763e11,
    "kV/cm" => 1.0e5 / 5.14220674763e11,
};

static MAGNETIC_FIELD_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "T" => 1.0 / 2.35051756758e5,
    "mT" => 1.0e-3 / 2.35051756758e5,
    "G" => 1.0e-4 / 2.35051756758e5,
};

static DISTANCE_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "bohr" => 1.0,
    "m" => 1.0 / 5.29177210903e-11,
    "nm" => 1.0e-9 / 5.29177210903e-11,
    "um" => 1.0e-6 / 5.29177210903e-11,
};

static ELECTRIC_DIPOLE_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "e*a0" => 1.0,
    "debye" => 1.0 / 2.541746473,
    "C*m" => 1.0 / 8.4783536255e-30,
};

static MAGNETIC_DIPOLE_UNITS: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
    "bohr_magneton" => 0.5,
    "J/T" => 1.0 / 1.85480201566e-23,
};

static ATOMIC_UNITS_ONLY: phf::Map<&'static str, f64> = phf_map! {
    "au" => 1.0,
};

// ================
// Error definition
// ================

/// Error for unit conversions requested for a unit that is not registered for the relevant
/// physical dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedUnitError(pub String);

impl fmt::Display for UnsupportedUnitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Unsupported unit: {}", self.0)
    }
}

impl Error for UnsupportedUnitError {}

// ==================
// Dimension handling
// ==================

/// An enumerated type for the physical dimensions known to the unit adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Energies, also accepted as frequencies via $`E = hf`$.
    Energy,

    /// Electric field strengths.
    ElectricField,

    /// Magnetic field strengths.
    MagneticField,

    /// Lengths, *e.g.* interatomic distances.
    Distance,

    /// Electric dipole moments.
    ElectricDipole,

    /// Electric quadrupole moments.
    ElectricQuadrupole,

    /// Electric octupole moments.
    ElectricOctupole,

    /// Magnetic dipole moments.
    MagneticDipole,

    /// Diamagnetic interaction strengths.
    Diamagnetic,
}

impl Dimension {
    fn unit_table(&self) -> &'static phf::Map<&'static str, f64> {
        match self {
            Dimension::Energy => &ENERGY_UNITS,
            Dimension::ElectricField => &ELECTRIC_FIELD_UNITS,
            Dimension::MagneticField => &MAGNETIC_FIELD_UNITS,
            Dimension::Distance => &DISTANCE_UNITS,
            Dimension::ElectricDipole => &ELECTRIC_DIPOLE_UNITS,
            Dimension::MagneticDipole => &MAGNETIC_DIPOLE_UNITS,
            Dimension::ElectricQuadrupole
            | Dimension::ElectricOctupole
            | Dimension::Diamagnetic => &ATOMIC_UNITS_ONLY,
        }
    }

    /// Returns the size of one `unit` of this dimension in atomic units.
    ///
    /// # Errors
    ///
    /// Errors with [`UnsupportedUnitError`] if the unit is not registered for this dimension.
    pub fn unit_factor(&self, unit: &str) -> Result<f64, UnsupportedUnitError> {
        self.unit_table()
            .get(unit.trim())
            .copied()
            .ok_or_else(|| UnsupportedUnitError(format!("`{unit}` is not a unit of {self}")))
    }

    /// Returns the registered units of this dimension in sorted order.
    pub fn supported_units(&self) -> Vec<&'static str> {
        self.unit_table().keys().copied().sorted().collect()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Energy => write!(f, "energy"),
            Dimension::ElectricField => write!(f, "electric field"),
            Dimension::MagneticField => write!(f, "magnetic field"),
            Dimension::Distance => write!(f, "distance"),
            Dimension::ElectricDipole => write!(f, "electric dipole moment"),
            Dimension::ElectricQuadrupole => write!(f, "electric quadrupole moment"),
            Dimension::ElectricOctupole => write!(f, "electric octupole moment"),
            Dimension::MagneticDipole => write!(f, "magnetic dipole moment"),
            Dimension::Diamagnetic => write!(f, "diamagnetic interaction"),
        }
    }
}

/// Converts a value given in `unit` to atomic units.
pub fn to_base_unit(
    value: f64,
    unit: &str,
    dimension: Dimension,
) -> Result<f64, UnsupportedUnitError> {
    Ok(value * dimension.unit_factor(unit)?)
}

/// Converts a value given in atomic units to `unit`.
pub fn from_base_unit(
    value: f64,
    unit: &str,
    dimension: Dimension,
) -> Result<f64, UnsupportedUnitError> {
    Ok(value / dimension.unit_factor(unit)?)
}

/// Returns the size of one composite `unit` in atomic units for a product of `dimensions`.
///
/// The composite unit is either [`BASE_UNIT`] on its own, or one unit per factor joined by
/// [`COMPOSITE_UNIT_SEPARATOR`], *e.g.* `"debye * debye"`. A dimensionless quantity accepts only
/// the base unit or an empty string.
pub fn composite_unit_factor(
    unit: &str,
    dimensions: &[Dimension],
) -> Result<f64, UnsupportedUnitError> {
    let unit = unit.trim();
    if unit == BASE_UNIT {
        return Ok(1.0);
    }
    if dimensions.is_empty() {
        return if unit.is_empty() {
            Ok(1.0)
        } else {
            Err(UnsupportedUnitError(format!(
                "`{unit}` given for a dimensionless quantity"
            )))
        };
    }
    let parts = unit.split(COMPOSITE_UNIT_SEPARATOR).collect_vec();
    if parts.len() != dimensions.len() {
        return Err(UnsupportedUnitError(format!(
            "`{unit}` has {} factor(s), but the quantity has dimensions [{}]",
            parts.len(),
            dimensions.iter().join(", ")
        )));
    }
    parts
        .iter()
        .zip(dimensions.iter())
        .try_fold(1.0, |acc, (part, dim)| -> Result<f64, UnsupportedUnitError> {
            Ok(acc * dim.unit_factor(part)?)
        })
}

// ========
// Quantity
// ========

/// Trait for values that can be multiplied by a real unit-conversion factor.
pub trait Rescalable {
    /// Returns a copy of the value multiplied by `factor`.
    fn rescaled(&self, factor: f64) -> Self;
}

impl Rescalable for f64 {
    fn rescaled(&self, factor: f64) -> Self {
        self * factor
    }
}

impl<T: PairScalar> Rescalable for Array1<T> {
    fn rescaled(&self, factor: f64) -> Self {
        let factor = T::from_real(factor);
        self.mapv(|x| x * factor)
    }
}

/// A value stored in atomic units together with the product of physical dimensions it carries.
#[derive(Clone, Debug)]
pub struct Quantity<V> {
    /// The value in atomic units.
    value: V,

    /// The physical dimensions whose product gives the dimension of the value. Empty for
    /// dimensionless quantities.
    dimensions: Vec<Dimension>,
}

impl<V: Rescalable> Quantity<V> {
    /// Wraps a value that is already in atomic units.
    pub fn from_base_unit(value: V, dimensions: &[Dimension]) -> Self {
        Self {
            value,
            dimensions: dimensions.to_vec(),
        }
    }

    /// Converts a value given in a composite `unit` into a quantity.
    pub fn from_unit(
        value: &V,
        unit: &str,
        dimensions: &[Dimension],
    ) -> Result<Self, UnsupportedUnitError> {
        let factor = composite_unit_factor(unit, dimensions)?;
        Ok(Self::from_base_unit(value.rescaled(factor), dimensions))
    }

    /// The value in atomic units.
    pub fn to_base_unit(&self) -> &V {
        &self.value
    }

    /// Returns the value expressed in a composite `unit`.
    pub fn to_unit(&self, unit: &str) -> Result<V, UnsupportedUnitError> {
        let factor = composite_unit_factor(unit, &self.dimensions)?;
        Ok(self.value.rescaled(1.0 / factor))
    }

    /// The physical dimensions of this quantity.
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }
}
