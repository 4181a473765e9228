//! Restricted product bases of two diagonalised atom systems.

use std::fmt;
use std::sync::Arc;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use log;
use ndarray::{s, Array1, Array2};
use rayon;
use serde::{Deserialize, Serialize};

use crate::auxiliary::scalar::PairScalar;
use crate::auxiliary::NUMERICAL_PRECISION;
use crate::basis::atom::BasisAtom;
use crate::basis::ket::{KetAtom, KetPair};
use crate::basis::sparse::CsrMatrix;
use crate::basis::Parity;
use crate::io::format::{fmt_half_integer, pairint_warn};
use crate::model::parameter::InvalidParameterError;
use crate::operator::{check_composite, OperatorType};
use crate::system::{AtomSystem, MissingDiagonalizationError};
use crate::units::{Dimension, Quantity, Rescalable, UnsupportedUnitError};

#[cfg(test)]
#[path = "pair_tests.rs"]
mod pair_tests;

/// Tolerance within which the total magnetic quantum number of a pair state is compared with the
/// bounds of an `m` restriction.
const M_TOLERANCE: f64 = 10.0 * f64::EPSILON;

/// An atom system shared between the pair bases built from it.
pub type SharedAtomSystem<T> = Arc<dyn AtomSystem<T>>;

// ============
// Restrictions
// ============

/// A closed pair-energy window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnergyWindow {
    pub min: f64,

    pub max: f64,

    /// The unit of `min` and `max`. `None` means atomic units.
    #[serde(default)]
    pub unit: Option<String>,
}

impl EnergyWindow {
    /// Returns `(min, max)` in atomic units.
    pub fn to_base_unit(&self) -> Result<(f64, f64), UnsupportedUnitError> {
        let factor = match self.unit.as_deref() {
            Some(unit) => Dimension::Energy.unit_factor(unit)?,
            None => 1.0,
        };
        Ok((self.min * factor, self.max * factor))
    }
}

impl fmt::Display for EnergyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6e}, {:.6e}] {}",
            self.min,
            self.max,
            self.unit.as_deref().unwrap_or("au")
        )
    }
}

/// Constraints on the product states retained in a pair basis. A product state is retained iff
/// it satisfies every constraint that is set.
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(deny_unknown_fields)]
pub struct BasisPairRestrictions {
    /// Bounds `(min, max)` of the total magnetic quantum number.
    #[builder(setter(custom), default = "None")]
    #[serde(default)]
    m: Option<(f64, f64)>,

    /// Required product of the parities of the two eigenstates.
    #[builder(setter(strip_option), default = "None")]
    #[serde(default)]
    product_of_parities: Option<Parity>,

    /// Window of the total energy.
    #[builder(setter(custom), default = "None")]
    #[serde(default)]
    energy: Option<EnergyWindow>,
}

impl BasisPairRestrictionsBuilder {
    pub fn m(&mut self, min: f64, max: f64) -> &mut Self {
        self.m = Some(Some((min, max)));
        self
    }

    pub fn energy(&mut self, min: f64, max: f64, unit: Option<&str>) -> &mut Self {
        self.energy = Some(Some(EnergyWindow {
            min,
            max,
            unit: unit.map(str::to_string),
        }));
        self
    }

    fn validate(&self) -> Result<(), String> {
        let restrictions = BasisPairRestrictions {
            m: self.m.clone().flatten(),
            product_of_parities: self.product_of_parities.flatten(),
            energy: self.energy.clone().flatten(),
        };
        restrictions
            .check()
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}

impl BasisPairRestrictions {
    /// Returns a builder to construct a new set of restrictions.
    pub fn builder() -> BasisPairRestrictionsBuilder {
        BasisPairRestrictionsBuilder::default()
    }

    pub fn m(&self) -> Option<(f64, f64)> {
        self.m
    }

    pub fn product_of_parities(&self) -> Option<Parity> {
        self.product_of_parities
    }

    pub fn energy(&self) -> Option<&EnergyWindow> {
        self.energy.as_ref()
    }

    /// Checks the bounds and returns the energy window in atomic units, if any.
    fn check(&self) -> Result<Option<(f64, f64)>, anyhow::Error> {
        if let Some((min, max)) = self.m {
            if !(min <= max) {
                return Err(InvalidParameterError(format!(
                    "the m restriction [{min}, {max}] is empty"
                ))
                .into());
            }
        }
        self.energy
            .as_ref()
            .map(|window| {
                let (min, max) = window.to_base_unit()?;
                if min <= max {
                    Ok((min, max))
                } else {
                    Err(InvalidParameterError(format!(
                        "the energy restriction {window} is empty"
                    ))
                    .into())
                }
            })
            .transpose()
    }
}

impl fmt::Display for BasisPairRestrictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total m: {}",
            self.m
                .map(|(min, max)| format!(
                    "[{}, {}]",
                    fmt_half_integer(min),
                    fmt_half_integer(max)
                ))
                .unwrap_or_else(|| "--".to_string())
        )?;
        writeln!(
            f,
            "Product of parities: {}",
            self.product_of_parities
                .map(|p| p.to_string())
                .unwrap_or_else(|| "--".to_string())
        )?;
        writeln!(
            f,
            "Total energy: {}",
            self.energy
                .as_ref()
                .map(|w| w.to_string())
                .unwrap_or_else(|| "--".to_string())
        )?;
        Ok(())
    }
}

// =================
// Query input/output
// =================

/// A single pair state to project onto.
#[derive(Clone, Copy, Debug)]
pub enum KetPairLike<'a> {
    /// A product state of a pair basis built from the same systems.
    Ket(&'a KetPair),

    /// A product of two atomic kets.
    Atoms(&'a KetAtom, &'a KetAtom),
}

/// A collection of pair states to project onto.
#[derive(Clone, Copy)]
pub enum BasisPairLike<'a, T: PairScalar> {
    /// The states of a pair basis built from the same systems.
    Pair(&'a BasisPair<T>),

    /// All products of the kets of two atomic bases, in row-major order.
    Atoms(&'a BasisAtom, &'a BasisAtom),
}

/// The target of an amplitude, overlap or matrix-element query.
#[derive(Clone, Copy)]
pub enum PairTarget<'a, T: PairScalar> {
    Single(KetPairLike<'a>),
    Batch(BasisPairLike<'a, T>),
}

/// The result of a query: a vector over the retained states for a single target, or a sparse
/// (target states × retained states) matrix for a batch target.
#[derive(Clone, Debug, PartialEq)]
pub enum Projection<S> {
    Single(Array1<S>),
    Batch(CsrMatrix<S>),
}

impl<S> Projection<S> {
    pub fn as_single(&self) -> Option<&Array1<S>> {
        match self {
            Projection::Single(values) => Some(values),
            Projection::Batch(_) => None,
        }
    }

    pub fn as_batch(&self) -> Option<&CsrMatrix<S>> {
        match self {
            Projection::Single(_) => None,
            Projection::Batch(values) => Some(values),
        }
    }
}

impl<T: PairScalar> Rescalable for Projection<T> {
    fn rescaled(&self, factor: f64) -> Self {
        match self {
            Projection::Single(values) => Projection::Single(values.rescaled(factor)),
            Projection::Batch(values) => Projection::Batch(values.rescaled(factor)),
        }
    }
}

/// Matrix elements either as a quantity in atomic units that carries the dimensions of the two
/// operators, or as plain values in a requested unit.
#[derive(Clone, Debug)]
pub enum MatrixElements<T: PairScalar> {
    Quantity(Quantity<Projection<T>>),
    Value(Projection<T>),
}

/// Bra states of a query, expressed per atom in the ket basis.
struct Bras<T> {
    /// Per atom, a (kets × bras) matrix whose columns are the bra states.
    vectors: [Array2<T>; 2],

    /// For each target state, the columns of `vectors` whose product it is.
    rows: Vec<(usize, usize)>,

    single: bool,
}

// =========
// BasisPair
// =========

/// A basis of product states of two diagonalised atom systems, restricted by
/// [`BasisPairRestrictions`].
///
/// The coefficient matrix has shape $`(n_1 n_2) \times d`$, where $`n_i`$ is the number of
/// eigenstates of system $`i`$ and $`d`$ the number of retained states. Retained state $`k`$,
/// the product of eigenstates $`i_1`$ and $`i_2`$, has a unit entry in row $`i_1 n_2 + i_2`$.
#[derive(Clone)]
pub struct BasisPair<T: PairScalar> {
    systems: [SharedAtomSystem<T>; 2],

    restrictions: BasisPairRestrictions,

    kets: Vec<KetPair>,

    coefficients: CsrMatrix<T>,
}

impl<T: PairScalar> BasisPair<T> {
    /// Builds the restricted product basis of two systems.
    ///
    /// Eigenstates are ordered by energy on each side, and retained pair states are ordered by
    /// the energy rank of the first atom, then that of the second.
    ///
    /// # Errors
    ///
    /// * [`MissingDiagonalizationError`] if a system is not diagonalised.
    /// * [`InvalidParameterError`] if `m` (parity) is restricted but not conserved by every
    /// eigenstate, or if a restriction is empty.
    /// * [`UnsupportedUnitError`] if the energy unit is unknown.
    ///
    /// All of these are raised before any product state is considered.
    pub fn new(
        systems: [SharedAtomSystem<T>; 2],
        restrictions: &BasisPairRestrictions,
    ) -> Result<Self, anyhow::Error> {
        for (i, system) in systems.iter().enumerate() {
            if !system.is_diagonal() {
                return Err(MissingDiagonalizationError(format!(
                    "system {} (`{}`) must be diagonalised before a pair basis can be built",
                    i + 1,
                    system.basis().species()
                ))
                .into());
            }
        }
        let has_m = systems.iter().all(|system| system.has_quantum_number_m());
        if restrictions.m.is_some() && !has_m {
            return Err(InvalidParameterError(
                "the total m must not be restricted because m is not well defined for every \
                eigenstate"
                    .to_string(),
            )
            .into());
        }
        if restrictions.product_of_parities.is_some()
            && !systems.iter().all(|system| system.has_parity())
        {
            return Err(InvalidParameterError(
                "the product of parities must not be restricted because the parity is not \
                defined for every eigenstate"
                    .to_string(),
            )
            .into());
        }
        let energy_window = restrictions.check()?;

        let [system1, system2] = &systems;
        let n1 = system1.number_of_states();
        let n2 = system2.number_of_states();
        let energies1 = (0..n1).map(|i| system1.eigenenergy(i)).collect_vec();
        let energies2 = (0..n2).map(|i| system2.eigenenergy(i)).collect_vec();
        let order1 = (0..n1)
            .sorted_by(|&a, &b| energies1[a].total_cmp(&energies1[b]))
            .collect_vec();
        let order2 = (0..n2)
            .sorted_by(|&a, &b| energies2[a].total_cmp(&energies2[b]))
            .collect_vec();
        let sorted_energies2 = order2.iter().map(|&i| energies2[i]).collect_vec();

        let mut kets = vec![];
        for &i1 in order1.iter() {
            let e1 = energies1[i1];
            let (lo, hi) = match energy_window {
                Some((min, max)) => (
                    sorted_energies2.partition_point(|&e2| e2 < min - e1),
                    sorted_energies2.partition_point(|&e2| e2 <= max - e1),
                ),
                None => (0, n2),
            };
            for &i2 in order2[lo..hi.max(lo)].iter() {
                let m = if has_m {
                    system1
                        .quantum_number_m(i1)
                        .zip(system2.quantum_number_m(i2))
                        .map(|(m1, m2)| m1 + m2)
                } else {
                    None
                };
                if let (Some((min, max)), Some(m)) = (restrictions.m, m) {
                    if m < min - M_TOLERANCE || m > max + M_TOLERANCE {
                        continue;
                    }
                }
                let parity = system1.parity(i1) * system2.parity(i2);
                if let Some(required) = restrictions.product_of_parities {
                    if parity != required {
                        continue;
                    }
                }
                let ket1 = system1.corresponding_ket(i1).ok_or_else(|| {
                    format_err!("No corresponding ket found for state {i1} of system 1.")
                })?;
                let ket2 = system2.corresponding_ket(i2).ok_or_else(|| {
                    format_err!("No corresponding ket found for state {i2} of system 2.")
                })?;
                kets.push(KetPair::new(
                    [i1, i2],
                    [n1, n2],
                    e1 + energies2[i2],
                    m,
                    parity,
                    [ket1.clone(), ket2.clone()],
                ));
            }
        }

        let coefficients = CsrMatrix::from_triplets(
            n1 * n2,
            kets.len(),
            kets.iter()
                .enumerate()
                .map(|(k, ket)| (ket.id(), k, T::from_real(1.0)))
                .collect_vec(),
        )?;
        log::debug!(
            "Retained {} of {} product states of `{}` and `{}`.",
            kets.len(),
            n1 * n2,
            system1.basis().species(),
            system2.basis().species()
        );
        if kets.is_empty() {
            pairint_warn!("No product state satisfies the pair-basis restrictions.");
        }

        Ok(Self {
            systems,
            restrictions: restrictions.clone(),
            kets,
            coefficients,
        })
    }

    /// The retained pair states in basis order.
    pub fn kets(&self) -> &[KetPair] {
        &self.kets
    }

    pub fn get_ket(&self, index: usize) -> Option<&KetPair> {
        self.kets.get(index)
    }

    /// The sparse $`(n_1 n_2) \times d`$ coefficient matrix.
    pub fn coefficients(&self) -> &CsrMatrix<T> {
        &self.coefficients
    }

    /// The number of retained states, $`d`$.
    pub fn number_of_states(&self) -> usize {
        self.kets.len()
    }

    /// The dimension of the product space of the two systems, $`n_1 n_2`$.
    pub fn number_of_kets(&self) -> usize {
        self.coefficients.shape().0
    }

    pub fn systems(&self) -> &[SharedAtomSystem<T>; 2] {
        &self.systems
    }

    pub fn restrictions(&self) -> &BasisPairRestrictions {
        &self.restrictions
    }

    /// Total energies of the retained states in atomic units.
    pub fn energies(&self) -> Vec<f64> {
        self.kets.iter().map(KetPair::energy).collect_vec()
    }

    /// Returns $`\langle \mathrm{target} | k \rangle`$ for every retained state $`k`$.
    pub fn get_amplitudes(&self, target: &PairTarget<'_, T>) -> Result<Projection<T>, anyhow::Error> {
        self.project(target, None)
    }

    /// Returns $`|\langle \mathrm{target} | k \rangle|^2`$ for every retained state $`k`$.
    pub fn get_overlaps(&self, target: &PairTarget<'_, T>) -> Result<Projection<f64>, anyhow::Error> {
        let overlaps = match self.get_amplitudes(target)? {
            Projection::Single(values) => Projection::Single(values.mapv(|x| x.norm_sqr())),
            Projection::Batch(values) => Projection::Batch(values.map(|x| x.norm_sqr())),
        };
        Ok(overlaps)
    }

    /// Returns $`\langle \mathrm{target} | O^{(1)}_{q_1} \otimes O^{(2)}_{q_2} | k \rangle`$ for
    /// every retained state $`k`$.
    ///
    /// # Arguments
    ///
    /// * `operators` - The operators acting on the first and second atom.
    /// * `qs` - Their spherical components.
    /// * `unit` - The composite unit of the result. With `None`, the result is a quantity in
    /// atomic units.
    ///
    /// # Errors
    ///
    /// Errors with [`UnsupportedOperatorError`](crate::operator::UnsupportedOperatorError) if an
    /// operator has no composite rule, a component exceeds its rank, or a system cannot provide
    /// it, and with [`UnsupportedUnitError`] if `unit` does not fit the operators' dimensions.
    pub fn get_matrix_elements(
        &self,
        target: &PairTarget<'_, T>,
        operators: (OperatorType, OperatorType),
        qs: (i32, i32),
        unit: Option<&str>,
    ) -> Result<MatrixElements<T>, anyhow::Error> {
        let dimensions = check_composite(operators, qs)?;
        let values = self.project(
            target,
            Some([(operators.0, qs.0), (operators.1, qs.1)]),
        )?;
        let quantity = Quantity::from_base_unit(values, &dimensions);
        match unit {
            None => Ok(MatrixElements::Quantity(quantity)),
            Some(unit) => Ok(MatrixElements::Value(quantity.to_unit(unit)?)),
        }
    }

    /// Expresses the target states per atom in the ket bases of the two systems.
    fn resolve_bras(&self, target: &PairTarget<'_, T>) -> Result<Bras<T>, anyhow::Error> {
        let [system1, system2] = &self.systems;
        match target {
            PairTarget::Single(KetPairLike::Atoms(ket1, ket2)) => Ok(Bras {
                vectors: [unit_column(&**system1, ket1)?, unit_column(&**system2, ket2)?],
                rows: vec![(0, 0)],
                single: true,
            }),
            PairTarget::Single(KetPairLike::Ket(ket)) => {
                let [j1, j2] = ket.state_indices();
                let sizes = [system1.number_of_states(), system2.number_of_states()];
                let compatible = ket.system_sizes() == sizes
                    && system1.corresponding_ket(j1) == Some(&ket.kets()[0])
                    && system2.corresponding_ket(j2) == Some(&ket.kets()[1]);
                if !compatible {
                    return Err(InvalidParameterError(format!(
                        "the pair ket {ket} does not belong to the systems of this basis"
                    ))
                    .into());
                }
                Ok(Bras {
                    vectors: [
                        system1.eigenvectors().slice(s![.., j1..j1 + 1]).to_owned(),
                        system2.eigenvectors().slice(s![.., j2..j2 + 1]).to_owned(),
                    ],
                    rows: vec![(0, 0)],
                    single: true,
                })
            }
            PairTarget::Batch(BasisPairLike::Atoms(basis1, basis2)) => {
                if *basis1 != system1.basis() || *basis2 != system2.basis() {
                    return Err(InvalidParameterError(format!(
                        "the bases {basis1} and {basis2} differ from the ket bases of this pair \
                        basis"
                    ))
                    .into());
                }
                let (nk1, nk2) = (basis1.number_of_kets(), basis2.number_of_kets());
                Ok(Bras {
                    vectors: [Array2::eye(nk1), Array2::eye(nk2)],
                    rows: (0..nk1).cartesian_product(0..nk2).collect_vec(),
                    single: false,
                })
            }
            PairTarget::Batch(BasisPairLike::Pair(other)) => {
                let shares_systems = self
                    .systems
                    .iter()
                    .zip(other.systems.iter())
                    .all(|(a, b)| {
                        Arc::ptr_eq(a, b)
                            || (a.basis() == b.basis() && a.eigenvectors() == b.eigenvectors())
                    });
                if !shares_systems {
                    return Err(InvalidParameterError(
                        "the other pair basis is not built from the systems of this basis"
                            .to_string(),
                    )
                    .into());
                }
                Ok(Bras {
                    vectors: [
                        system1.eigenvectors().to_owned(),
                        system2.eigenvectors().to_owned(),
                    ],
                    rows: other
                        .kets
                        .iter()
                        .map(|ket| {
                            let [j1, j2] = ket.state_indices();
                            (j1, j2)
                        })
                        .collect_vec(),
                    single: false,
                })
            }
        }
    }

    /// Computes $`\langle \mathrm{target} | A_1 \otimes A_2 | k \rangle`$, with $`A_i`$ the
    /// identity if `operators` is `None`.
    fn project(
        &self,
        target: &PairTarget<'_, T>,
        operators: Option<[(OperatorType, i32); 2]>,
    ) -> Result<Projection<T>, anyhow::Error> {
        let bras = self.resolve_bras(target)?;
        let [system1, system2] = &self.systems;
        let [bra1, bra2] = &bras.vectors;
        let (m1, m2) = rayon::join(
            || project_atom(&**system1, bra1, operators.map(|ops| ops[0])),
            || project_atom(&**system2, bra2, operators.map(|ops| ops[1])),
        );
        let (m1, m2) = (m1?, m2?);

        let element = |(a, b): (usize, usize), ket: &KetPair| {
            let [i1, i2] = ket.state_indices();
            m1[(a, i1)] * m2[(b, i2)]
        };
        if bras.single {
            let values = self
                .kets
                .iter()
                .map(|ket| element(bras.rows[0], ket))
                .collect::<Array1<T>>();
            Ok(Projection::Single(values))
        } else {
            let triplets = bras
                .rows
                .iter()
                .enumerate()
                .flat_map(|(r, &row)| {
                    self.kets
                        .iter()
                        .enumerate()
                        .map(move |(k, ket)| (r, k, element(row, ket)))
                })
                .filter(|(_, _, value)| value.abs() > NUMERICAL_PRECISION)
                .collect_vec();
            Ok(Projection::Batch(CsrMatrix::from_triplets(
                bras.rows.len(),
                self.kets.len(),
                triplets,
            )?))
        }
    }
}

/// Returns the ket-basis column of `ket`.
fn unit_column<T: PairScalar>(
    system: &dyn AtomSystem<T>,
    ket: &KetAtom,
) -> Result<Array2<T>, anyhow::Error> {
    let index = system.basis().get_ket_index(ket).ok_or_else(|| {
        InvalidParameterError(format!(
            "ket {ket} is not part of the basis {}",
            system.basis()
        ))
    })?;
    let mut column = Array2::zeros((system.basis().number_of_kets(), 1));
    column[(index, 0)] = T::from_real(1.0);
    Ok(column)
}

/// Computes $`W^\dagger A U`$ for bras $`W`$, operator $`A`$ and eigenvectors $`U`$ of one atom.
fn project_atom<T: PairScalar>(
    system: &dyn AtomSystem<T>,
    bras: &Array2<T>,
    operator: Option<(OperatorType, i32)>,
) -> Result<Array2<T>, anyhow::Error> {
    let bras_h = bras.t().mapv(|x| x.conj());
    let eigenvectors = system.eigenvectors();
    match operator {
        Some((operator, q)) => Ok(bras_h
            .dot(&system.operator_matrix(operator, q)?)
            .dot(eigenvectors)),
        None => Ok(bras_h.dot(eigenvectors)),
    }
}

impl<T: PairScalar> fmt::Debug for BasisPair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasisPair")
            .field(
                "species",
                &[
                    self.systems[0].basis().species(),
                    self.systems[1].basis().species(),
                ],
            )
            .field("restrictions", &self.restrictions)
            .field("kets", &self.kets)
            .finish()
    }
}

impl<T: PairScalar> fmt::Display for BasisPair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kets.as_slice() {
            [] => write!(f, "BasisPair()"),
            [only] => write!(f, "BasisPair({only})"),
            [first, .., last] => write!(f, "BasisPair({first} ... {last})"),
        }
    }
}
