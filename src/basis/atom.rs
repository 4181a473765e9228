//! Ordered bases of atomic kets.

use std::fmt;

use itertools::Itertools;

use crate::basis::ket::KetAtom;
use crate::model::SpeciesMismatchError;
use crate::model::parameter::InvalidParameterError;

/// An ordered, non-empty list of kets of a single species.
#[derive(Clone, Debug, PartialEq)]
pub struct BasisAtom {
    species: String,
    kets: Vec<KetAtom>,
}

impl BasisAtom {
    /// Constructs a basis from its kets.
    ///
    /// # Errors
    ///
    /// Errors with [`InvalidParameterError`] if `kets` is empty, or with
    /// [`SpeciesMismatchError`] if the kets belong to more than one species.
    pub fn new(kets: Vec<KetAtom>) -> Result<Self, anyhow::Error> {
        let species = kets
            .first()
            .ok_or_else(|| InvalidParameterError("an atomic basis needs at least one ket".to_string()))?
            .species()
            .to_string();
        if let Some(ket) = kets.iter().find(|ket| ket.species() != species) {
            return Err(SpeciesMismatchError(format!(
                "ket `{ket}` does not belong to a basis of species `{species}`"
            ))
            .into());
        }
        Ok(Self { species, kets })
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn kets(&self) -> &[KetAtom] {
        &self.kets
    }

    pub fn number_of_kets(&self) -> usize {
        self.kets.len()
    }

    /// Returns the position of `ket` in this basis, if present.
    pub fn get_ket_index(&self, ket: &KetAtom) -> Option<usize> {
        self.kets.iter().position(|k| k == ket)
    }

    /// Field-free energies of the kets in atomic units.
    pub fn energies(&self) -> Vec<f64> {
        self.kets.iter().map(KetAtom::energy).collect_vec()
    }
}

impl fmt::Display for BasisAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kets.as_slice() {
            [only] => write!(f, "BasisAtom({only})"),
            [first, .., last] => write!(f, "BasisAtom({first} ... {last})"),
            [] => write!(f, "BasisAtom()"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::basis::atom::BasisAtom;
    use crate::basis::ket::KetAtom;
    use crate::model::SpeciesMismatchError;

    fn ket(species: &str, n: i32) -> KetAtom {
        KetAtom::builder()
            .species(species)
            .n(n)
            .nu(n as f64)
            .l(0.0)
            .j(0.5)
            .f(0.5)
            .m(0.5)
            .energy(-0.5 / (n * n) as f64)
            .build()
            .unwrap()
    }

    #[test]
    fn test_basis_atom_new() {
        let basis = BasisAtom::new(vec![ket("Rb", 59), ket("Rb", 60), ket("Rb", 61)]).unwrap();
        assert_eq!(basis.species(), "Rb");
        assert_eq!(basis.number_of_kets(), 3);
        assert_eq!(basis.get_ket_index(&ket("Rb", 60)), Some(1));
        assert_eq!(basis.get_ket_index(&ket("Rb", 62)), None);
        assert_eq!(
            basis.to_string(),
            "BasisAtom(Rb:59,S_1/2,1/2 ... Rb:61,S_1/2,1/2)"
        );

        let err = BasisAtom::new(vec![ket("Rb", 60), ket("Cs", 60)]).unwrap_err();
        assert!(err.downcast_ref::<SpeciesMismatchError>().is_some());
        assert!(BasisAtom::new(vec![]).is_err());
    }
}
