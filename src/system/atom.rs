//! A concrete single-atom system assembled from a ket basis, applied fields and engine-supplied
//! operator matrices.

use std::fmt;

use anyhow::{self, ensure, format_err};
use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use log;
use ndarray::{Array1, Array2};

use crate::auxiliary::scalar::PairScalar;
use crate::auxiliary::NUMERICAL_PRECISION;
use crate::basis::atom::BasisAtom;
use crate::basis::Parity;
use crate::io::format::{nice_bool, write_subtitle};
use crate::model::atom::FieldConfiguration;
use crate::operator::{OperatorType, UnsupportedOperatorError};
use crate::system::{AtomSystem, Diagonalizer};

#[cfg(test)]
#[path = "atom_tests.rs"]
mod atom_tests;

// ==================
// Struct definitions
// ==================

/// Eigenstates of a system, with the quantum numbers that are conserved by each of them.
#[derive(Clone, Debug)]
struct Eigenbasis<T: PairScalar> {
    energies: Array1<f64>,

    /// (kets × states)
    vectors: Array2<T>,

    m: Vec<Option<f64>>,

    parities: Vec<Parity>,

    diagonal: bool,
}

/// A single-atom system.
///
/// Until [`SystemAtom::diagonalize`] is called, the states of the system are its kets and their
/// energies are the diagonal elements of the Hamiltonian.
#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SystemAtom<T: PairScalar> {
    /// The ket basis.
    basis: BasisAtom,

    /// Cartesian components of the electric field in atomic units.
    #[builder(default = "[0.0; 3]")]
    electric_field: [f64; 3],

    /// Cartesian components of the magnetic field in atomic units.
    #[builder(default = "[0.0; 3]")]
    magnetic_field: [f64; 3],

    /// Operator matrices in the ket basis supplied by the engine, keyed by operator and
    /// spherical component.
    #[builder(setter(custom), default = "IndexMap::new()")]
    operators: IndexMap<(OperatorType, i32), Array2<T>>,

    /// The Hamiltonian in the ket basis. Assembled from the fields and the dipole operators if
    /// not given.
    #[builder(setter(custom), default = "self.assemble_hamiltonian()?")]
    hamiltonian: Array2<T>,

    #[builder(setter(skip), default = "self.ket_eigenbasis()?")]
    eigenbasis: Eigenbasis<T>,
}

impl<T: PairScalar> SystemAtomBuilder<T> {
    /// Adds the matrix of `operator` with spherical component `q`.
    pub fn operator(&mut self, operator: OperatorType, q: i32, matrix: Array2<T>) -> &mut Self {
        self.operators
            .get_or_insert_with(IndexMap::new)
            .insert((operator, q), matrix);
        self
    }

    /// Sets a Hamiltonian, bypassing its assembly from the fields.
    pub fn hamiltonian(&mut self, hamiltonian: Array2<T>) -> &mut Self {
        self.hamiltonian = Some(hamiltonian);
        self
    }

    /// Sets both fields from a configuration of a field sweep.
    pub fn fields(&mut self, configuration: &FieldConfiguration) -> &mut Self {
        self.electric_field = Some(configuration.electric_field);
        self.magnetic_field = Some(configuration.magnetic_field);
        self
    }

    fn validate(&self) -> Result<(), String> {
        let basis = self.basis.as_ref().ok_or("No ket basis found.".to_string())?;
        let nkets = basis.number_of_kets();
        let efield = self.electric_field.unwrap_or([0.0; 3]);
        let bfield = self.magnetic_field.unwrap_or([0.0; 3]);

        let real_ok = T::IS_COMPLEX || (efield[1] == 0.0 && bfield[1] == 0.0);
        if !real_ok {
            log::error!(
                "Fields with y-components (E_y = {}, B_y = {}) require a complex representation.",
                efield[1],
                bfield[1]
            );
        }

        let operators_ok = self
            .operators
            .as_ref()
            .map(|operators| {
                operators.iter().all(|((operator, q), matrix)| {
                    let component_ok = operator.check_component(*q).is_ok();
                    let shape_ok = matrix.dim() == (nkets, nkets);
                    if !component_ok || !shape_ok {
                        log::error!(
                            "Operator `{operator}` (q = {q}) has shape {:?} or an invalid \
                            component for a basis of {nkets} kets.",
                            matrix.dim()
                        );
                    }
                    component_ok && shape_ok
                })
            })
            .unwrap_or(true);

        let hamiltonian_ok = self
            .hamiltonian
            .as_ref()
            .map(|h| h.dim() == (nkets, nkets))
            .unwrap_or(true);
        if !hamiltonian_ok {
            log::error!("The Hamiltonian does not match a basis of {nkets} kets.");
        }

        if real_ok && operators_ok && hamiltonian_ok {
            Ok(())
        } else {
            Err("Atom system validation failed.".to_string())
        }
    }

    /// Assembles $`H = H_0 - \sum_q (-1)^q E_{-q} d_q - \sum_q (-1)^q B_{-q} \mu_q`$ in the ket
    /// basis.
    fn assemble_hamiltonian(&self) -> Result<Array2<T>, String> {
        let basis = self.basis.as_ref().ok_or("No ket basis found.".to_string())?;
        let mut hamiltonian = Array2::from_diag(
            &basis
                .kets()
                .iter()
                .map(|ket| T::from_real(ket.energy()))
                .collect::<Array1<T>>(),
        );
        let empty = IndexMap::new();
        let operators = self.operators.as_ref().unwrap_or(&empty);
        for (operator, field) in [
            (
                OperatorType::ElectricDipole,
                self.electric_field.unwrap_or([0.0; 3]),
            ),
            (
                OperatorType::MagneticDipole,
                self.magnetic_field.unwrap_or([0.0; 3]),
            ),
        ] {
            for (q, component) in spherical_components::<T>(&field)? {
                if component == T::zero() {
                    continue;
                }
                // (-1)^q F_{-q} couples to the q-th component of the operator.
                let matrix = operators.get(&(operator, q)).ok_or_else(|| {
                    format!("The field couples to `{operator}` (q = {q}), but its matrix is missing.")
                })?;
                let sign = if q.rem_euclid(2) == 0 {
                    T::from_real(-1.0)
                } else {
                    T::from_real(1.0)
                };
                hamiltonian = hamiltonian + matrix * (component * sign);
            }
        }
        Ok(hamiltonian)
    }

    /// The trivial eigenbasis in which every ket is a state.
    fn ket_eigenbasis(&self) -> Result<Eigenbasis<T>, String> {
        let basis = self.basis.as_ref().ok_or("No ket basis found.".to_string())?;
        let energies = match self.hamiltonian.as_ref() {
            Some(h) => h.diag().mapv(|x| x.re()),
            None => self.assemble_hamiltonian()?.diag().mapv(|x| x.re()),
        };
        let nkets = basis.number_of_kets();
        Ok(Eigenbasis {
            energies,
            vectors: Array2::eye(nkets),
            m: basis.kets().iter().map(|ket| Some(ket.m())).collect(),
            parities: basis.kets().iter().map(|ket| ket.parity()).collect(),
            diagonal: false,
        })
    }
}

/// Returns the non-trivial spherical components $`(q, F_{-q})`$ of a Cartesian field, with
/// $`F_0 = F_z`$ and $`F_{\pm 1} = \mp (F_x \pm i F_y) / \sqrt{2}`$.
fn spherical_components<T: PairScalar>(field: &[f64; 3]) -> Result<Vec<(i32, T)>, String> {
    let [x, y, z] = *field;
    let s = std::f64::consts::FRAC_1_SQRT_2;
    let to_scalar = |re: f64, im: f64| {
        T::from_parts(re, im)
            .ok_or_else(|| format!("A field component ({re}, {im}i) is not representable."))
    };
    Ok(vec![
        // q = -1 couples to F_{+1}.
        (-1, to_scalar(-x * s, -y * s)?),
        (0, to_scalar(z, 0.0)?),
        // q = +1 couples to F_{-1}.
        (1, to_scalar(x * s, -y * s)?),
    ])
}

impl<T: PairScalar> SystemAtom<T> {
    /// Returns a builder to construct a new atom system.
    pub fn builder() -> SystemAtomBuilder<T> {
        SystemAtomBuilder::default()
    }

    /// Cartesian components of the electric field in atomic units.
    pub fn electric_field(&self) -> [f64; 3] {
        self.electric_field
    }

    /// Cartesian components of the magnetic field in atomic units.
    pub fn magnetic_field(&self) -> [f64; 3] {
        self.magnetic_field
    }

    /// The Hamiltonian in the ket basis.
    pub fn hamiltonian(&self) -> &Array2<T> {
        &self.hamiltonian
    }

    /// All eigenenergies in atomic units.
    pub fn eigenenergies(&self) -> &Array1<f64> {
        &self.eigenbasis.energies
    }

    /// Diagonalises the Hamiltonian and replaces the states of the system by its eigenstates.
    ///
    /// The magnetic quantum number (parity) of an eigenstate is defined if all kets with a
    /// non-negligible weight in it share the same magnetic quantum number (parity).
    pub fn diagonalize(
        &mut self,
        diagonalizer: &dyn Diagonalizer<T>,
    ) -> Result<&mut Self, anyhow::Error> {
        let nkets = self.basis.number_of_kets();
        let (energies, vectors) = diagonalizer.diagonalize(&self.hamiltonian)?;
        ensure!(
            vectors.nrows() == nkets && vectors.ncols() == energies.len(),
            "The eigensolver returned {} eigenvalues and eigenvectors of shape {:?} for {} kets.",
            energies.len(),
            vectors.dim(),
            nkets
        );

        let kets = self.basis.kets();
        let (m, parities): (Vec<_>, Vec<_>) = vectors
            .columns()
            .into_iter()
            .map(|column| {
                let dominant = column
                    .iter()
                    .zip(kets.iter())
                    .filter(|(c, _)| c.norm_sqr() > NUMERICAL_PRECISION)
                    .map(|(_, ket)| ket)
                    .collect_vec();
                let m = dominant
                    .iter()
                    .map(|ket| ket.m())
                    .reduce(|a, b| if (a - b).abs() < 1e-9 { a } else { f64::NAN })
                    .filter(|m| !m.is_nan());
                let parity = dominant
                    .iter()
                    .map(|ket| ket.parity())
                    .reduce(|a, b| if a == b { a } else { Parity::Unknown })
                    .unwrap_or(Parity::Unknown);
                (m, parity)
            })
            .unzip();

        log::debug!(
            "Diagonalised a {nkets}-ket system of `{}`: {} eigenstate(s), m conserved: {}.",
            self.basis.species(),
            energies.len(),
            nice_bool(m.iter().all(Option::is_some))
        );
        self.eigenbasis = Eigenbasis {
            energies,
            vectors,
            m,
            parities,
            diagonal: true,
        };
        Ok(self)
    }
}

impl<T: PairScalar> AtomSystem<T> for SystemAtom<T> {
    fn is_diagonal(&self) -> bool {
        self.eigenbasis.diagonal
    }

    fn basis(&self) -> &BasisAtom {
        &self.basis
    }

    fn number_of_states(&self) -> usize {
        self.eigenbasis.energies.len()
    }

    fn eigenenergy(&self, state: usize) -> f64 {
        self.eigenbasis.energies[state]
    }

    fn eigenvectors(&self) -> &Array2<T> {
        &self.eigenbasis.vectors
    }

    fn quantum_number_m(&self, state: usize) -> Option<f64> {
        self.eigenbasis.m.get(state).copied().flatten()
    }

    fn parity(&self, state: usize) -> Parity {
        self.eigenbasis
            .parities
            .get(state)
            .copied()
            .unwrap_or(Parity::Unknown)
    }

    fn operator_matrix(&self, operator: OperatorType, q: i32) -> Result<Array2<T>, anyhow::Error> {
        operator.check_component(q)?;
        let nkets = self.basis.number_of_kets();
        match operator {
            OperatorType::Identity => Ok(Array2::eye(nkets)),
            OperatorType::Zero => Ok(Array2::zeros((nkets, nkets))),
            OperatorType::Energy => Ok(Array2::from_diag(
                &self
                    .basis
                    .kets()
                    .iter()
                    .map(|ket| T::from_real(ket.energy()))
                    .collect::<Array1<T>>(),
            )),
            _ => self.operators.get(&(operator, q)).cloned().ok_or_else(|| {
                format_err!(UnsupportedOperatorError(format!(
                    "no matrix of `{operator}` (q = {q}) was supplied for `{}`",
                    self.basis.species()
                )))
            }),
        }
    }
}

impl<T: PairScalar> fmt::Display for SystemAtom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, &format!("Atom system: {}", self.basis))?;
        writeln!(f, "Kets: {}", self.basis.number_of_kets())?;
        writeln!(f, "States: {}", self.number_of_states())?;
        writeln!(f, "Diagonalised: {}", nice_bool(self.is_diagonal()))?;
        writeln!(
            f,
            "Electric field (au): ({})",
            self.electric_field.iter().map(|x| format!("{x:+.3e}")).join(", ")
        )?;
        writeln!(
            f,
            "Magnetic field (au): ({})",
            self.magnetic_field.iter().map(|x| format!("{x:+.3e}")).join(", ")
        )?;
        writeln!(
            f,
            "Supplied operators: {}",
            self.operators
                .keys()
                .map(|(operator, q)| format!("{operator} (q = {q})"))
                .join(", ")
        )?;
        Ok(())
    }
}
