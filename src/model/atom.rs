//! Validated constraint models of single atoms.

use std::fmt;

use itertools::Itertools;
use log;
use serde::{Deserialize, Serialize};

use crate::io::format::{nice_bool, write_subtitle};
use crate::model::parameter::{InvalidParameterError, Parameter, ParameterScalar};
use crate::model::state::{ModelStateAtom, ModelStateAtomInput};
use crate::model::is_half_integer;
use crate::units::Dimension;

#[cfg(test)]
#[path = "atom_tests.rs"]
mod atom_tests;

// ==================
// Struct definitions
// ==================

// ~~~~~~~~~~~
// BoundTriple
// ~~~~~~~~~~~

/// An optional `(min, max, delta)` triple bounding a quantum number or an energy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound = "V: ParameterScalar", deny_unknown_fields)]
pub struct BoundTriple<V: ParameterScalar> {
    #[serde(default)]
    pub min: Option<V>,

    #[serde(default)]
    pub max: Option<V>,

    #[serde(default)]
    pub delta: Option<V>,
}

impl<V: ParameterScalar> BoundTriple<V> {
    /// Constructs a triple from its three optional components.
    pub fn new(min: Option<V>, max: Option<V>, delta: Option<V>) -> Self {
        Self { min, max, delta }
    }

    /// Checks ordering and step sign.
    fn violations(&self, name: &str) -> Vec<InvalidParameterError> {
        let mut violations = vec![];
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if !(min <= max) {
                violations.push(InvalidParameterError(format!(
                    "`{name}` has a minimum {min} exceeding its maximum {max}"
                )));
            }
        }
        if let Some(delta) = self.delta {
            if !(delta >= V::zero()) {
                violations.push(InvalidParameterError(format!(
                    "`{name}` has a negative step {delta}"
                )));
            }
        }
        violations
    }

    /// Checks that both bounds, where given, satisfy `predicate`.
    fn domain_violation<F>(&self, name: &str, predicate: F, description: &str) -> Option<InvalidParameterError>
    where
        F: Fn(V) -> bool,
    {
        let offending = [self.min, self.max]
            .into_iter()
            .flatten()
            .filter(|v| !predicate(*v))
            .collect_vec();
        if offending.is_empty() {
            None
        } else {
            Some(InvalidParameterError(format!(
                "`{name}` must be {description}, got {}",
                offending.iter().join(", ")
            )))
        }
    }
}

impl BoundTriple<f64> {
    fn rescaled(&self, factor: f64) -> Self {
        Self {
            min: self.min.map(|v| v * factor),
            max: self.max.map(|v| v * factor),
            delta: self.delta.map(|v| v * factor),
        }
    }
}

impl<V: ParameterScalar> fmt::Display for BoundTriple<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: Option<V>| v.map(|v| v.to_string()).unwrap_or_else(|| "--".to_string());
        write!(
            f,
            "[{}, {}] (step {})",
            show(self.min),
            show(self.max),
            show(self.delta)
        )
    }
}

// ~~~~~~~~~~~~~~~~~~~~~~~
// Channel-specific bounds
// ~~~~~~~~~~~~~~~~~~~~~~~

/// Quantum-number bounds of an atom described by a single quantum-defect channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingleChannelBounds {
    #[serde(default)]
    pub n: BoundTriple<i32>,
    #[serde(default)]
    pub nu: BoundTriple<f64>,
    #[serde(default)]
    pub l: BoundTriple<i32>,
    #[serde(default)]
    pub s: BoundTriple<f64>,
    #[serde(default)]
    pub j: BoundTriple<f64>,
    #[serde(default)]
    pub m: BoundTriple<f64>,
}

/// Quantum-number bounds of an atom described by several coupled quantum-defect channels, for
/// which only the effective principal quantum number and the total momentum are sharp.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MultiChannelBounds {
    #[serde(default)]
    pub n: BoundTriple<f64>,
    #[serde(default)]
    pub nu: BoundTriple<f64>,
    #[serde(default)]
    pub l: BoundTriple<f64>,
    #[serde(default)]
    pub s: BoundTriple<f64>,
    #[serde(default)]
    pub j: BoundTriple<f64>,
    #[serde(default)]
    pub f: BoundTriple<f64>,
    #[serde(default)]
    pub m: BoundTriple<f64>,
}

/// An enumerated type for the internal structure of an atom, which decides the quantum-number
/// axes that are validated and exposed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum ModelAtomKind {
    /// Variant for atoms modelled with one quantum-defect channel (SQDT).
    SingleChannel(SingleChannelBounds),

    /// Variant for atoms modelled with several coupled quantum-defect channels (MQDT).
    MultiChannel(MultiChannelBounds),
}

impl Default for ModelAtomKind {
    fn default() -> Self {
        ModelAtomKind::SingleChannel(SingleChannelBounds::default())
    }
}

impl ModelAtomKind {
    fn violations(&self) -> Vec<InvalidParameterError> {
        let mut violations = vec![];
        match self {
            ModelAtomKind::SingleChannel(b) => {
                violations.extend(b.n.violations("n"));
                violations.extend(b.nu.violations("nu"));
                violations.extend(b.l.violations("l"));
                violations.extend(b.s.violations("s"));
                violations.extend(b.j.violations("j"));
                violations.extend(b.m.violations("m"));
                violations.extend(
                    [
                        b.n.domain_violation("n", |n| n >= 1, "positive"),
                        b.nu.domain_violation("nu", |nu| nu > 0.0, "positive"),
                        b.l.domain_violation("l", |l| l >= 0, "non-negative"),
                        b.s.domain_violation(
                            "s",
                            |s| s >= 0.0 && is_half_integer(s),
                            "a non-negative half-integer",
                        ),
                        b.j.domain_violation(
                            "j",
                            |j| j >= 0.0 && is_half_integer(j),
                            "a non-negative half-integer",
                        ),
                        b.m.domain_violation("m", is_half_integer, "a half-integer"),
                    ]
                    .into_iter()
                    .flatten(),
                );
            }
            ModelAtomKind::MultiChannel(b) => {
                violations.extend(b.n.violations("n"));
                violations.extend(b.nu.violations("nu"));
                violations.extend(b.l.violations("l"));
                violations.extend(b.s.violations("s"));
                violations.extend(b.j.violations("j"));
                violations.extend(b.f.violations("f"));
                violations.extend(b.m.violations("m"));
                violations.extend(
                    [
                        b.n.domain_violation("n", |n| n > 0.0, "positive"),
                        b.nu.domain_violation("nu", |nu| nu > 0.0, "positive"),
                        b.l.domain_violation("l", |l| l >= 0.0, "non-negative"),
                        b.s.domain_violation("s", |s| s >= 0.0, "non-negative"),
                        b.j.domain_violation("j", |j| j >= 0.0, "non-negative"),
                        b.f.domain_violation(
                            "f",
                            |f| f >= 0.0 && is_half_integer(f),
                            "a non-negative half-integer",
                        ),
                        b.m.domain_violation("m", is_half_integer, "a half-integer"),
                    ]
                    .into_iter()
                    .flatten(),
                );
            }
        }
        violations
    }

    /// Returns `true` for the multi-channel variant.
    pub fn is_multi_channel(&self) -> bool {
        matches!(self, ModelAtomKind::MultiChannel(_))
    }
}

impl fmt::Display for ModelAtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelAtomKind::SingleChannel(b) => {
                writeln!(f, "Channel kind: single-channel")?;
                writeln!(f, "  n : {}", b.n)?;
                writeln!(f, "  nu: {}", b.nu)?;
                writeln!(f, "  l : {}", b.l)?;
                writeln!(f, "  s : {}", b.s)?;
                writeln!(f, "  j : {}", b.j)?;
                writeln!(f, "  m : {}", b.m)?;
            }
            ModelAtomKind::MultiChannel(b) => {
                writeln!(f, "Channel kind: multi-channel")?;
                writeln!(f, "  n : {}", b.n)?;
                writeln!(f, "  nu: {}", b.nu)?;
                writeln!(f, "  l : {}", b.l)?;
                writeln!(f, "  s : {}", b.s)?;
                writeln!(f, "  j : {}", b.j)?;
                writeln!(f, "  f : {}", b.f)?;
                writeln!(f, "  m : {}", b.m)?;
            }
        }
        Ok(())
    }
}

// ~~~~~~~~~~~~~~
// ModelAtomInput
// ~~~~~~~~~~~~~~

/// Plain record describing an atom model as read from a configuration. Nothing is checked until
/// it is turned into a [`ModelAtom`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelAtomInput {
    /// The species of the atom, *e.g.* `Rb` or `Sr88_singlet`.
    pub species: String,

    /// The channel kind and its quantum-number bounds.
    #[serde(default)]
    pub quantum_numbers: ModelAtomKind,

    /// Energy window for the states kept before diagonalisation.
    #[serde(default)]
    pub energy: BoundTriple<f64>,

    /// Energy window for the eigenstates kept after diagonalisation.
    #[serde(default)]
    pub energy_after_diagonalization: BoundTriple<f64>,

    /// Unit of both energy windows. `None` means atomic units.
    #[serde(default)]
    pub energy_unit: Option<String>,

    #[serde(default)]
    pub efield_x: Parameter<f64>,
    #[serde(default)]
    pub efield_y: Parameter<f64>,
    #[serde(default)]
    pub efield_z: Parameter<f64>,

    /// Unit of the electric-field components. `None` means atomic units.
    #[serde(default)]
    pub efield_unit: Option<String>,

    #[serde(default)]
    pub bfield_x: Parameter<f64>,
    #[serde(default)]
    pub bfield_y: Parameter<f64>,
    #[serde(default)]
    pub bfield_z: Parameter<f64>,

    /// Unit of the magnetic-field components. `None` means atomic units.
    #[serde(default)]
    pub bfield_unit: Option<String>,

    /// States whose behaviour the calculation is about.
    #[serde(default)]
    pub states_of_interest: Vec<ModelStateAtomInput>,

    /// States that are added to the basis regardless of the bounds.
    #[serde(default)]
    pub additionally_included_states: Vec<ModelStateAtomInput>,
}

impl ModelAtomInput {
    /// Collects every violation of this record, in the order: species and nested states,
    /// bounds, units. Each entry wraps a
    /// [`SpeciesMismatchError`](crate::model::SpeciesMismatchError),
    /// an [`InvalidParameterError`] or an
    /// [`UnsupportedUnitError`](crate::units::UnsupportedUnitError).
    pub fn violations(&self) -> Vec<anyhow::Error> {
        let mut violations: Vec<anyhow::Error> = vec![];
        if self.species.trim().is_empty() {
            violations.push(InvalidParameterError("the species must not be empty".to_string()).into());
        }

        for (group, states) in [
            ("states_of_interest", &self.states_of_interest),
            ("additionally_included_states", &self.additionally_included_states),
        ] {
            for (i, state) in states.iter().enumerate() {
                violations.extend(state.violations(
                    &self.species,
                    &self.quantum_numbers,
                    &format!("{group}[{i}]"),
                ));
            }
        }

        violations.extend(
            self.energy
                .violations("energy")
                .into_iter()
                .chain(
                    self.energy_after_diagonalization
                        .violations("energy_after_diagonalization"),
                )
                .chain(self.quantum_numbers.violations())
                .map(anyhow::Error::from),
        );

        for (unit, dimension) in [
            (&self.energy_unit, Dimension::Energy),
            (&self.efield_unit, Dimension::ElectricField),
            (&self.bfield_unit, Dimension::MagneticField),
        ] {
            if let Some(unit) = unit {
                if let Err(err) = dimension.unit_factor(unit) {
                    violations.push(err.into());
                }
            }
        }
        violations
    }
}

// ~~~~~~~~~~~~~~~~~~
// FieldConfiguration
// ~~~~~~~~~~~~~~~~~~

/// One concrete set of applied fields, in atomic units, drawn from the sweep of an atom model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfiguration {
    /// Cartesian components of the electric field.
    pub electric_field: [f64; 3],

    /// Cartesian components of the magnetic field.
    pub magnetic_field: [f64; 3],
}

impl fmt::Display for FieldConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "E = ({}), B = ({})",
            self.electric_field.iter().map(|x| format!("{x:+.3e}")).join(", "),
            self.magnetic_field.iter().map(|x| format!("{x:+.3e}")).join(", "),
        )
    }
}

/// An enumerated type for the numeric field in which a system must be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    /// Real-valued Hamiltonians suffice (`f64`).
    Real,

    /// Complex-valued Hamiltonians are required (`Complex<f64>`).
    Complex,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Real => write!(f, "real"),
            ScalarKind::Complex => write!(f, "complex"),
        }
    }
}

// ~~~~~~~~~
// ModelAtom
// ~~~~~~~~~

/// A validated constraint model of one atom. All field parameters and energy windows are held
/// in atomic units, and all nested state descriptors carry the atom's species.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelAtomInput", into = "ModelAtomInput")]
pub struct ModelAtom {
    species: String,
    kind: ModelAtomKind,
    energy: BoundTriple<f64>,
    energy_after_diagonalization: BoundTriple<f64>,
    electric_field: [Parameter<f64>; 3],
    magnetic_field: [Parameter<f64>; 3],
    states_of_interest: Vec<ModelStateAtom>,
    additionally_included_states: Vec<ModelStateAtom>,
}

impl ModelAtom {
    /// Validates a plain record and constructs the model from it.
    ///
    /// # Errors
    ///
    /// Errors with the first violation found by [`ModelAtomInput::violations`].
    pub fn new(input: &ModelAtomInput) -> Result<Self, anyhow::Error> {
        let mut violations = input.violations();
        if !violations.is_empty() {
            log::debug!(
                "Atom model for `{}` has {} violation(s); reporting the first one.",
                input.species,
                violations.len()
            );
            return Err(violations.swap_remove(0));
        }

        let energy_factor = input
            .energy_unit
            .as_deref()
            .map(|unit| Dimension::Energy.unit_factor(unit))
            .transpose()?
            .unwrap_or(1.0);
        let efield_unit = input.efield_unit.as_deref();
        let bfield_unit = input.bfield_unit.as_deref();
        let electric_field = [
            input.efield_x.to_base_unit(efield_unit, Dimension::ElectricField)?,
            input.efield_y.to_base_unit(efield_unit, Dimension::ElectricField)?,
            input.efield_z.to_base_unit(efield_unit, Dimension::ElectricField)?,
        ];
        let magnetic_field = [
            input.bfield_x.to_base_unit(bfield_unit, Dimension::MagneticField)?,
            input.bfield_y.to_base_unit(bfield_unit, Dimension::MagneticField)?,
            input.bfield_z.to_base_unit(bfield_unit, Dimension::MagneticField)?,
        ];

        let resolve = |states: &[ModelStateAtomInput]| {
            states
                .iter()
                .map(|state| ModelStateAtom::resolve(state, &input.species))
                .collect_vec()
        };

        Ok(Self {
            species: input.species.clone(),
            kind: input.quantum_numbers.clone(),
            energy: input.energy.rescaled(energy_factor),
            energy_after_diagonalization: input
                .energy_after_diagonalization
                .rescaled(energy_factor),
            electric_field,
            magnetic_field,
            states_of_interest: resolve(&input.states_of_interest),
            additionally_included_states: resolve(&input.additionally_included_states),
        })
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    /// The channel kind and its quantum-number bounds.
    pub fn kind(&self) -> &ModelAtomKind {
        &self.kind
    }

    /// Energy window before diagonalisation, in atomic units.
    pub fn energy(&self) -> &BoundTriple<f64> {
        &self.energy
    }

    /// Energy window after diagonalisation, in atomic units.
    pub fn energy_after_diagonalization(&self) -> &BoundTriple<f64> {
        &self.energy_after_diagonalization
    }

    /// Cartesian components of the electric field, in atomic units.
    pub fn electric_field(&self) -> &[Parameter<f64>; 3] {
        &self.electric_field
    }

    /// Cartesian components of the magnetic field, in atomic units.
    pub fn magnetic_field(&self) -> &[Parameter<f64>; 3] {
        &self.magnetic_field
    }

    pub fn states_of_interest(&self) -> &[ModelStateAtom] {
        &self.states_of_interest
    }

    pub fn additionally_included_states(&self) -> &[ModelStateAtom] {
        &self.additionally_included_states
    }

    /// Returns `true` if the atom can be described by a real Hamiltonian, *i.e.* neither field
    /// ever has a $`y`$-component.
    pub fn is_real(&self) -> bool {
        let vanishes = |p: &Parameter<f64>| p.get_min() == 0.0 && p.get_max() == 0.0;
        vanishes(&self.electric_field[1]) && vanishes(&self.magnetic_field[1])
    }

    /// Returns the numeric field in which this atom has to be represented.
    pub fn scalar_kind(&self) -> ScalarKind {
        if self.is_real() {
            ScalarKind::Real
        } else {
            ScalarKind::Complex
        }
    }

    /// Returns the number of field configurations in the sweep, without expanding it.
    pub fn number_of_configurations(&self) -> usize {
        self.electric_field
            .iter()
            .chain(self.magnetic_field.iter())
            .map(Parameter::len)
            .product()
    }

    /// Expands the six field components into the Cartesian product of concrete field
    /// configurations. The $`x`$-component of the electric field varies slowest and the
    /// $`z`$-component of the magnetic field fastest.
    pub fn field_configurations(&self) -> Vec<FieldConfiguration> {
        let configurations = self
            .electric_field
            .iter()
            .chain(self.magnetic_field.iter())
            .map(Parameter::expand)
            .multi_cartesian_product()
            .map(|v| FieldConfiguration {
                electric_field: [v[0], v[1], v[2]],
                magnetic_field: [v[3], v[4], v[5]],
            })
            .collect_vec();
        log::debug!(
            "Expanded the field sweep of `{}` into {} configuration(s).",
            self.species,
            configurations.len()
        );
        configurations
    }
}

impl TryFrom<ModelAtomInput> for ModelAtom {
    type Error = anyhow::Error;

    fn try_from(input: ModelAtomInput) -> Result<Self, Self::Error> {
        Self::new(&input)
    }
}

impl From<ModelAtom> for ModelAtomInput {
    fn from(model: ModelAtom) -> Self {
        let [efield_x, efield_y, efield_z] = model.electric_field;
        let [bfield_x, bfield_y, bfield_z] = model.magnetic_field;
        Self {
            species: model.species,
            quantum_numbers: model.kind,
            energy: model.energy,
            energy_after_diagonalization: model.energy_after_diagonalization,
            energy_unit: None,
            efield_x,
            efield_y,
            efield_z,
            efield_unit: None,
            bfield_x,
            bfield_y,
            bfield_z,
            bfield_unit: None,
            states_of_interest: model
                .states_of_interest
                .iter()
                .map(ModelStateAtomInput::from)
                .collect(),
            additionally_included_states: model
                .additionally_included_states
                .iter()
                .map(ModelStateAtomInput::from)
                .collect(),
        }
    }
}

impl fmt::Display for ModelAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, &format!("Atom model: {}", self.species))?;
        write!(f, "{}", self.kind)?;
        writeln!(f, "Energy window (au): {}", self.energy)?;
        writeln!(
            f,
            "Energy window after diagonalisation (au): {}",
            self.energy_after_diagonalization
        )?;
        let axes = ["x", "y", "z"];
        for (axis, p) in axes.iter().zip(self.electric_field.iter()) {
            writeln!(f, "E_{axis} (au): {p}")?;
        }
        for (axis, p) in axes.iter().zip(self.magnetic_field.iter()) {
            writeln!(f, "B_{axis} (au): {p}")?;
        }
        writeln!(f, "Real representation: {}", nice_bool(self.is_real()))?;
        writeln!(f, "Field configurations: {}", self.number_of_configurations())?;
        if !self.states_of_interest.is_empty() {
            writeln!(
                f,
                "States of interest: {}",
                self.states_of_interest.iter().join(", ")
            )?;
        }
        if !self.additionally_included_states.is_empty() {
            writeln!(
                f,
                "Additionally included states: {}",
                self.additionally_included_states.iter().join(", ")
            )?;
        }
        Ok(())
    }
}
