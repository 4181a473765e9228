//! Single-atom systems and the capabilities a diagonalisation engine provides.

use std::error::Error;
use std::fmt;

use anyhow::{self, ensure};
use ndarray::{Array1, Array2};

use crate::auxiliary::scalar::PairScalar;
use crate::basis::atom::BasisAtom;
use crate::basis::ket::KetAtom;
use crate::basis::Parity;
use crate::operator::OperatorType;

pub mod atom;

// ================
// Error definition
// ================

/// Error for operations that require a diagonalised system but were given one that is not.
#[derive(Debug, Clone, PartialEq)]
pub struct MissingDiagonalizationError(pub String);

impl fmt::Display for MissingDiagonalizationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Missing diagonalisation: {}", self.0)
    }
}

impl Error for MissingDiagonalizationError {}

// =================
// Trait definitions
// =================

/// Trait for single-atom systems whose eigenstates can be combined into pair states.
///
/// The states of a system that has not been diagonalised are its kets.
pub trait AtomSystem<T: PairScalar>: Send + Sync {
    /// Returns `true` if the system has been diagonalised.
    fn is_diagonal(&self) -> bool;

    /// The ket basis in which eigenvectors and operators are expressed.
    fn basis(&self) -> &BasisAtom;

    /// The number of states.
    fn number_of_states(&self) -> usize;

    /// The energy of state `state` in atomic units.
    fn eigenenergy(&self, state: usize) -> f64;

    /// The eigenvectors as the columns of a (kets × states) matrix.
    fn eigenvectors(&self) -> &Array2<T>;

    /// The magnetic quantum number of state `state`, if it is well defined.
    fn quantum_number_m(&self, state: usize) -> Option<f64>;

    /// The parity of state `state`.
    fn parity(&self, state: usize) -> Parity;

    /// The matrix of operator `operator` with spherical component `q` in the ket basis.
    fn operator_matrix(&self, operator: OperatorType, q: i32) -> Result<Array2<T>, anyhow::Error>;

    /// Returns `true` if every state has a well-defined magnetic quantum number.
    fn has_quantum_number_m(&self) -> bool {
        (0..self.number_of_states()).all(|state| self.quantum_number_m(state).is_some())
    }

    /// Returns `true` if every state has a defined parity.
    fn has_parity(&self) -> bool {
        (0..self.number_of_states()).all(|state| self.parity(state).is_defined())
    }

    /// Returns the index of the ket with the largest weight in state `state`.
    fn corresponding_ket_index(&self, state: usize) -> Option<usize> {
        if state >= self.number_of_states() {
            return None;
        }
        self.eigenvectors()
            .column(state)
            .iter()
            .map(PairScalar::norm_sqr)
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, w)| match best {
                Some((_, bw)) if bw >= w => best,
                _ => Some((i, w)),
            })
            .map(|(i, _)| i)
    }

    /// Returns the ket with the largest weight in state `state`.
    fn corresponding_ket(&self, state: usize) -> Option<&KetAtom> {
        self.corresponding_ket_index(state)
            .and_then(|i| self.basis().kets().get(i))
    }
}

/// Trait for eigensolvers of Hermitian matrices.
pub trait Diagonalizer<T: PairScalar> {
    /// Diagonalises `matrix` and returns its eigenvalues together with the eigenvectors as the
    /// columns of a matrix.
    fn diagonalize(&self, matrix: &Array2<T>) -> Result<(Array1<f64>, Array2<T>), anyhow::Error>;
}

/// Eigensolver for matrices that are already diagonal.
#[derive(Clone, Copy, Debug)]
pub struct DiagonalDiagonalizer {
    /// Largest off-diagonal modulus tolerated.
    pub threshold: f64,
}

impl Default for DiagonalDiagonalizer {
    fn default() -> Self {
        Self { threshold: 1e-14 }
    }
}

impl<T: PairScalar> Diagonalizer<T> for DiagonalDiagonalizer {
    fn diagonalize(&self, matrix: &Array2<T>) -> Result<(Array1<f64>, Array2<T>), anyhow::Error> {
        ensure!(
            matrix.is_square(),
            "Only square matrices can be diagonalised, got shape {:?}.",
            matrix.shape()
        );
        let offdiagonal = matrix
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, x)| x.abs())
            .fold(0.0, f64::max);
        ensure!(
            offdiagonal <= self.threshold,
            "The matrix has off-diagonal elements of modulus up to {offdiagonal:.3e}, above the \
            threshold {:.3e}; use a general eigensolver instead.",
            self.threshold
        );
        let energies = matrix.diag().mapv(|x| x.re());
        Ok((energies, Array2::eye(matrix.nrows())))
    }
}
