//! Scalar parameters that are either constant, listed explicitly, or swept over a range.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;

use itertools::Itertools;
use num_traits::{Num, NumCast, ToPrimitive};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::units::{Dimension, UnsupportedUnitError};

#[cfg(test)]
#[path = "parameter_tests.rs"]
mod parameter_tests;

/// Tolerance, in units of the step size, within which the upper bound of a range is still
/// considered reached.
const RANGE_TOLERANCE: f64 = 1e-10;

// ================
// Error definition
// ================

/// Error for malformed parameter values and bound triples.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidParameterError(pub String);

impl fmt::Display for InvalidParameterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid parameter: {}", self.0)
    }
}

impl Error for InvalidParameterError {}

// ================
// Trait definition
// ================

/// Trait for numeric types that parameters can hold.
pub trait ParameterScalar:
    Copy
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Num
    + NumCast
    + ToPrimitive
    + Serialize
    + DeserializeOwned
{
}

impl ParameterScalar for f64 {}

impl ParameterScalar for i32 {}

fn is_finite<V: ToPrimitive>(value: &V) -> bool {
    value.to_f64().map_or(false, f64::is_finite)
}

// ==================
// Struct definitions
// ==================

// ~~~~~~~~~~~~~
// ParameterList
// ~~~~~~~~~~~~~

/// A non-empty, ordered list of parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Vec<V>",
    into = "Vec<V>",
    bound = "V: ParameterScalar"
)]
pub struct ParameterList<V: ParameterScalar> {
    values: Vec<V>,
}

impl<V: ParameterScalar> TryFrom<Vec<V>> for ParameterList<V> {
    type Error = InvalidParameterError;

    fn try_from(values: Vec<V>) -> Result<Self, Self::Error> {
        if values.is_empty() {
            return Err(InvalidParameterError(
                "a parameter list must not be empty".to_string(),
            ));
        }
        if !values.iter().all(is_finite) {
            return Err(InvalidParameterError(format!(
                "a parameter list must only contain finite values: [{}]",
                values.iter().join(", ")
            )));
        }
        Ok(Self { values })
    }
}

impl<V: ParameterScalar> From<ParameterList<V>> for Vec<V> {
    fn from(list: ParameterList<V>) -> Self {
        list.values
    }
}

impl<V: ParameterScalar> ParameterList<V> {
    /// The stored values in their original order.
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

// ~~~~~~~~~~~~~~
// ParameterRange
// ~~~~~~~~~~~~~~

/// Serialised form of a [`ParameterRange`], validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "V: ParameterScalar")]
pub struct ParameterRangeInput<V: ParameterScalar> {
    pub min: V,
    pub max: V,
    pub delta: V,
}

/// A closed interval $`[\mathrm{min}, \mathrm{max}]`$ swept with a positive step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ParameterRangeInput<V>",
    into = "ParameterRangeInput<V>",
    bound = "V: ParameterScalar"
)]
pub struct ParameterRange<V: ParameterScalar> {
    min: V,
    max: V,
    delta: V,
    steps: usize,
}

impl<V: ParameterScalar> ParameterRange<V> {
    /// Constructs a new range.
    ///
    /// # Errors
    ///
    /// Errors with [`InvalidParameterError`] if a bound or the step is not finite, if `delta` is
    /// not strictly positive, if `min > max`, or if the progression has more values than can be
    /// counted.
    pub fn new(min: V, max: V, delta: V) -> Result<Self, InvalidParameterError> {
        if ![min, max, delta].iter().all(is_finite) {
            return Err(InvalidParameterError(format!(
                "the bounds and step of a range must be finite, got [{min}, {max}] in steps of \
                {delta}"
            )));
        }
        if !(delta > V::zero()) {
            return Err(InvalidParameterError(format!(
                "the step of a range must be positive, got {delta}"
            )));
        }
        match min.partial_cmp(&max) {
            Some(Ordering::Less) | Some(Ordering::Equal) => {}
            _ => {
                return Err(InvalidParameterError(format!(
                    "the minimum of a range must not exceed its maximum, got [{min}, {max}]"
                )))
            }
        }
        let steps = Self::count_steps(min, max, delta).ok_or_else(|| {
            InvalidParameterError(format!(
                "the range [{min}, {max}] in steps of {delta} has too many values to be swept"
            ))
        })?;
        Ok(Self {
            min,
            max,
            delta,
            steps,
        })
    }

    /// The lower bound.
    pub fn min(&self) -> V {
        self.min
    }

    /// The upper bound.
    pub fn max(&self) -> V {
        self.max
    }

    /// The step size.
    pub fn delta(&self) -> V {
        self.delta
    }

    /// Returns the number of values in the progression.
    fn number_of_steps(&self) -> usize {
        self.steps
    }

    /// Counts the values in the progression, or returns `None` if they cannot be counted.
    fn count_steps(min: V, max: V, delta: V) -> Option<usize> {
        let span = max.to_f64()? - min.to_f64()?;
        let intervals = (span / delta.to_f64()? + RANGE_TOLERANCE).floor();
        if intervals.is_finite() && intervals < usize::MAX as f64 {
            intervals.to_usize().map(|intervals| intervals + 1)
        } else {
            None
        }
    }
}

impl<V: ParameterScalar> TryFrom<ParameterRangeInput<V>> for ParameterRange<V> {
    type Error = InvalidParameterError;

    fn try_from(input: ParameterRangeInput<V>) -> Result<Self, Self::Error> {
        Self::new(input.min, input.max, input.delta)
    }
}

impl<V: ParameterScalar> From<ParameterRange<V>> for ParameterRangeInput<V> {
    fn from(range: ParameterRange<V>) -> Self {
        Self {
            min: range.min,
            max: range.max,
            delta: range.delta,
        }
    }
}

// ~~~~~~~~~
// Parameter
// ~~~~~~~~~

/// Serialised form of a [`Parameter`], validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, bound = "V: ParameterScalar")]
pub enum ParameterInput<V: ParameterScalar> {
    Constant(V),
    List(ParameterList<V>),
    Range(ParameterRange<V>),
}

/// A possibly multi-valued scalar parameter.
///
/// In configuration files, a number is read as [`Parameter::Constant`], a sequence as
/// [`Parameter::List`], and a map with `min`, `max` and `delta` keys as [`Parameter::Range`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ParameterInput<V>",
    into = "ParameterInput<V>",
    bound = "V: ParameterScalar"
)]
pub enum Parameter<V: ParameterScalar> {
    /// A single value.
    Constant(V),

    /// An explicit list of values.
    List(ParameterList<V>),

    /// A range swept with a fixed step.
    Range(ParameterRange<V>),
}

impl<V: ParameterScalar> TryFrom<ParameterInput<V>> for Parameter<V> {
    type Error = InvalidParameterError;

    fn try_from(input: ParameterInput<V>) -> Result<Self, Self::Error> {
        match input {
            ParameterInput::Constant(value) => Self::constant(value),
            ParameterInput::List(list) => Ok(Parameter::List(list)),
            ParameterInput::Range(range) => Ok(Parameter::Range(range)),
        }
    }
}

impl<V: ParameterScalar> From<Parameter<V>> for ParameterInput<V> {
    fn from(parameter: Parameter<V>) -> Self {
        match parameter {
            Parameter::Constant(value) => ParameterInput::Constant(value),
            Parameter::List(list) => ParameterInput::List(list),
            Parameter::Range(range) => ParameterInput::Range(range),
        }
    }
}

impl<V: ParameterScalar> Default for Parameter<V> {
    fn default() -> Self {
        Parameter::Constant(V::zero())
    }
}

impl<V: ParameterScalar> Parameter<V> {
    /// Constructs a constant parameter.
    ///
    /// # Errors
    ///
    /// Errors with [`InvalidParameterError`] if `value` is not finite.
    pub fn constant(value: V) -> Result<Self, InvalidParameterError> {
        if is_finite(&value) {
            Ok(Parameter::Constant(value))
        } else {
            Err(InvalidParameterError(format!(
                "a constant parameter must be finite, got {value}"
            )))
        }
    }

    /// Constructs a list parameter.
    ///
    /// # Errors
    ///
    /// Errors with [`InvalidParameterError`] if `values` is empty or holds a non-finite value.
    pub fn list(values: &[V]) -> Result<Self, InvalidParameterError> {
        Ok(Parameter::List(ParameterList::try_from(values.to_vec())?))
    }

    /// Constructs a range parameter. See [`ParameterRange::new`].
    pub fn range(min: V, max: V, delta: V) -> Result<Self, InvalidParameterError> {
        Ok(Parameter::Range(ParameterRange::new(min, max, delta)?))
    }

    /// Returns the minimum value across the parameter's domain without expanding it.
    pub fn get_min(&self) -> V {
        match self {
            Parameter::Constant(value) => *value,
            Parameter::List(list) => list
                .values
                .iter()
                .copied()
                .reduce(|a, b| if b < a { b } else { a })
                .unwrap_or_else(V::zero),
            Parameter::Range(range) => range.min,
        }
    }

    /// Returns the maximum value across the parameter's domain without expanding it. For a
    /// range, this is its upper bound whether or not the progression reaches it.
    pub fn get_max(&self) -> V {
        match self {
            Parameter::Constant(value) => *value,
            Parameter::List(list) => list
                .values
                .iter()
                .copied()
                .reduce(|a, b| if b > a { b } else { a })
                .unwrap_or_else(V::zero),
            Parameter::Range(range) => range.max,
        }
    }

    /// Returns every concrete value to sweep over.
    pub fn expand(&self) -> Vec<V> {
        match self {
            Parameter::Constant(value) => vec![*value],
            Parameter::List(list) => list.values.clone(),
            Parameter::Range(range) => {
                // Offsets are taken in `f64` so that integer steps cannot overflow past `max`.
                let (min, delta) = (range.min.to_f64(), range.delta.to_f64());
                (0..range.number_of_steps())
                    .filter_map(|i| match (min, delta) {
                        (Some(min), Some(delta)) => {
                            <V as NumCast>::from(min + delta * i as f64)
                        }
                        _ => None,
                    })
                    .collect()
            }
        }
    }

    /// Returns the number of values [`Self::expand`] produces, without expanding.
    pub fn len(&self) -> usize {
        match self {
            Parameter::Constant(_) => 1,
            Parameter::List(list) => list.values.len(),
            Parameter::Range(range) => range.number_of_steps(),
        }
    }

    /// Parameters always hold at least one value.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if the parameter takes more than one value.
    pub fn is_varying(&self) -> bool {
        self.len() > 1
    }
}

impl Parameter<f64> {
    /// Normalises the parameter to atomic units.
    ///
    /// # Arguments
    ///
    /// * `unit` - The unit the stored values are given in. `None` means they are already in
    /// atomic units.
    /// * `dimension` - The physical dimension of the parameter.
    ///
    /// # Errors
    ///
    /// Errors with [`UnsupportedUnitError`] if `unit` is not registered for `dimension`.
    pub fn to_base_unit(
        &self,
        unit: Option<&str>,
        dimension: Dimension,
    ) -> Result<Parameter<f64>, UnsupportedUnitError> {
        let factor = match unit {
            Some(unit) => dimension.unit_factor(unit)?,
            None => return Ok(self.clone()),
        };
        let normalised = match self {
            Parameter::Constant(value) => Parameter::Constant(value * factor),
            Parameter::List(list) => Parameter::List(ParameterList {
                values: list.values.iter().map(|v| v * factor).collect(),
            }),
            Parameter::Range(range) => Parameter::Range(ParameterRange {
                min: range.min * factor,
                max: range.max * factor,
                delta: range.delta * factor,
                steps: range.steps,
            }),
        };
        Ok(normalised)
    }
}

impl<V: ParameterScalar> fmt::Display for Parameter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parameter::Constant(value) => write!(f, "{value}"),
            Parameter::List(list) => write!(f, "[{}]", list.values.iter().join(", ")),
            Parameter::Range(range) => {
                write!(f, "{} to {} in steps of {}", range.min, range.max, range.delta)
            }
        }
    }
}
