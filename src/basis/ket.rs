//! Atomic kets and product kets of atom pairs.

use std::fmt;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::basis::Parity;
use crate::io::format::fmt_half_integer;

#[cfg(test)]
#[path = "ket_tests.rs"]
mod ket_tests;

/// Spectroscopic letters of the lowest orbital angular momenta.
const L_LABELS: [&str; 6] = ["S", "P", "D", "F", "G", "H"];

// ~~~~~~~
// KetAtom
// ~~~~~~~

/// A state of a single atom, labelled by its (expectation values of) quantum numbers.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KetAtom {
    /// The species of the atom.
    #[builder(setter(into))]
    species: String,

    /// The principal quantum number, or `0` if it is not an integer-defined quantity.
    #[builder(default = "0")]
    n: i32,

    /// The effective principal quantum number.
    nu: f64,

    /// The (expectation value of the) orbital angular momentum.
    l: f64,

    /// The (expectation value of the) spin.
    #[builder(default = "0.5")]
    s: f64,

    /// The (expectation value of the) electronic total angular momentum.
    j: f64,

    /// The total angular momentum. Equal to `j` for atoms without hyperfine structure.
    f: f64,

    /// The projection of the total angular momentum on the quantisation axis.
    m: f64,

    #[builder(default = "Parity::Unknown")]
    parity: Parity,

    /// The field-free energy in atomic units.
    energy: f64,
}

impl KetAtom {
    /// Returns a builder to construct a new atomic ket.
    pub fn builder() -> KetAtomBuilder {
        KetAtomBuilder::default()
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn n(&self) -> i32 {
        self.n
    }

    pub fn nu(&self) -> f64 {
        self.nu
    }

    pub fn l(&self) -> f64 {
        self.l
    }

    pub fn s(&self) -> f64 {
        self.s
    }

    pub fn j(&self) -> f64 {
        self.j
    }

    pub fn f(&self) -> f64 {
        self.f
    }

    pub fn m(&self) -> f64 {
        self.m
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    /// The field-free energy in atomic units.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Returns the spectroscopic label without the species, *e.g.* `60,S_1/2`.
    pub fn label(&self) -> String {
        let mut label = if self.n > 0 {
            format!("{},", self.n)
        } else {
            format!("{:.1},", self.nu)
        };
        if (self.s - 0.5).abs() > 1e-9 {
            label += &format!("^{{{}}}", fmt_half_integer(2.0 * self.s + 1.0));
        }
        let l_rounded = self.l.round();
        let l_label = if (self.l - l_rounded).abs() < 1e-9 && l_rounded >= 0.0 {
            L_LABELS.get(l_rounded as usize).copied()
        } else {
            None
        };
        label += &l_label
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:.1}", self.l));
        label += &format!("_{}", fmt_half_integer(self.f));
        label
    }
}

impl fmt::Display for KetAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{},{}",
            self.species,
            self.label(),
            fmt_half_integer(self.m)
        )
    }
}

// ~~~~~~~
// KetPair
// ~~~~~~~

/// A product of one eigenstate of each of the two systems of a pair basis.
///
/// Pair kets are only ever produced by [`BasisPair`](crate::basis::pair::BasisPair).
#[derive(Clone, Debug, PartialEq)]
pub struct KetPair {
    /// Index of the product state, `i1 * n2 + i2`.
    id: usize,

    /// Eigenstate indices `(i1, i2)` in the two systems.
    state_indices: [usize; 2],

    /// Numbers of eigenstates `(n1, n2)` of the two systems.
    system_sizes: [usize; 2],

    /// Total energy in atomic units.
    energy: f64,

    /// Total magnetic quantum number, if both systems conserve it.
    m: Option<f64>,

    parity: Parity,

    /// The atomic kets that have the largest overlaps with the two eigenstates.
    kets: [KetAtom; 2],
}

impl KetPair {
    pub(crate) fn new(
        state_indices: [usize; 2],
        system_sizes: [usize; 2],
        energy: f64,
        m: Option<f64>,
        parity: Parity,
        kets: [KetAtom; 2],
    ) -> Self {
        Self {
            id: state_indices[0] * system_sizes[1] + state_indices[1],
            state_indices,
            system_sizes,
            energy,
            m,
            parity,
            kets,
        }
    }

    /// Index of this product state in the product space of the two systems.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state_indices(&self) -> [usize; 2] {
        self.state_indices
    }

    pub(crate) fn system_sizes(&self) -> [usize; 2] {
        self.system_sizes
    }

    /// Total energy in atomic units.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn m(&self) -> Option<f64> {
        self.m
    }

    /// Product of the parities of the two eigenstates.
    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn kets(&self) -> &[KetAtom; 2] {
        &self.kets
    }
}

impl fmt::Display for KetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}; {}⟩", self.kets[0], self.kets[1])
    }
}
