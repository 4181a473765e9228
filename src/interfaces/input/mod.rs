//! The top-level `pairint` configuration record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::drivers::pair_basis_construction::PairBasisConstructionParams;
use crate::io::format::write_title;
use crate::model::atom::{ModelAtom, ScalarKind};


/// A structure containing `pairint` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// The model of the first atom.
    pub atom1: ModelAtom,

    /// The model of the second atom. If not specified, the second atom is a copy of the first.
    #[serde(default)]
    pub atom2: Option<ModelAtom>,

    /// Parameters for the construction of the pair basis.
    ///
    /// # Default
    ///
    /// If not specified, no restrictions are applied.
    #[serde(default)]
    pub pair_basis: PairBasisConstructionParams,
}

impl Input {
    /// The models of the two atoms.
    pub fn atoms(&self) -> [&ModelAtom; 2] {
        [&self.atom1, self.atom2.as_ref().unwrap_or(&self.atom1)]
    }

    /// The numeric field in which both atom systems must be represented. A single complex atom
    /// makes the whole pair complex.
    pub fn scalar_kind(&self) -> ScalarKind {
        if self.atoms().iter().all(|atom| atom.is_real()) {
            ScalarKind::Real
        } else {
            ScalarKind::Complex
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_title(f, "Input")?;
        writeln!(f)?;
        let [atom1, atom2] = self.atoms();
        write!(f, "{atom1}")?;
        writeln!(f)?;
        if self.atom2.is_some() {
            write!(f, "{atom2}")?;
        } else {
            writeln!(f, "Second atom: same as the first")?;
        }
        writeln!(f)?;
        writeln!(f, "Pair representation: {}", self.scalar_kind())?;
        writeln!(f)?;
        write!(f, "{}", self.pair_basis)
    }
}
