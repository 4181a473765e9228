//! Driver for the construction of restricted pair bases.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::auxiliary::scalar::PairScalar;
use crate::basis::pair::{BasisPair, BasisPairRestrictions, SharedAtomSystem};
use crate::drivers::PairIntDriver;
use crate::io::format::{
    fmt_half_integer, log_subtitle, log_title, nice_bool, pairint_error, pairint_output,
    write_subtitle, PairIntOutput,
};

#[cfg(test)]
#[path = "pair_basis_construction_tests.rs"]
mod pair_basis_construction_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// Structure containing control parameters for pair-basis construction.
#[derive(Clone, Builder, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PairBasisConstructionParams {
    /// The constraints on the retained product states.
    #[builder(default)]
    #[serde(default)]
    pub restrictions: BasisPairRestrictions,

    /// Boolean indicating if the retained pair states are to be printed out.
    #[builder(default = "false")]
    #[serde(default)]
    pub print_kets: bool,
}

impl PairBasisConstructionParams {
    /// Returns a builder to construct a [`PairBasisConstructionParams`] structure.
    pub fn builder() -> PairBasisConstructionParamsBuilder {
        PairBasisConstructionParamsBuilder::default()
    }
}

impl fmt::Display for PairBasisConstructionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "Pair-basis restrictions")?;
        write!(f, "{}", self.restrictions)?;
        writeln!(f, "Print retained pair states: {}", nice_bool(self.print_kets))?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// Structure to contain pair-basis construction results.
#[derive(Clone, Builder, Debug)]
pub struct PairBasisConstructionResult<T: PairScalar> {
    /// The constructed pair basis.
    basis: BasisPair<T>,
}

impl<T: PairScalar> PairBasisConstructionResult<T> {
    fn builder() -> PairBasisConstructionResultBuilder<T> {
        PairBasisConstructionResultBuilder::default()
    }

    /// The constructed pair basis.
    pub fn basis(&self) -> &BasisPair<T> {
        &self.basis
    }
}

impl<T: PairScalar> fmt::Display for PairBasisConstructionResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [system1, system2] = self.basis.systems();
        writeln!(
            f,
            "Atoms: {} ({} states) and {} ({} states)",
            system1.basis().species(),
            system1.number_of_states(),
            system2.basis().species(),
            system2.number_of_states()
        )?;
        writeln!(
            f,
            "Retained pair states: {} of {}",
            self.basis.number_of_states(),
            self.basis.number_of_kets()
        )?;
        let energies = self.basis.energies();
        if let Some((min, max)) = energies.iter().copied().minmax().into_option() {
            writeln!(f, "Pair-energy range (au): [{min:+.8e}, {max:+.8e}]")?;
        }
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// Driver structure for building a restricted pair basis from two diagonalised systems.
#[derive(Clone, Builder)]
pub struct PairBasisConstructionDriver<'a, T: PairScalar> {
    /// The control parameters.
    parameters: &'a PairBasisConstructionParams,

    /// The two diagonalised systems.
    systems: [SharedAtomSystem<T>; 2],

    /// The result of the construction.
    #[builder(setter(skip), default = "None")]
    result: Option<PairBasisConstructionResult<T>>,
}

impl<'a, T: PairScalar> PairBasisConstructionDriver<'a, T> {
    /// Returns a builder to construct a [`PairBasisConstructionDriver`] structure.
    pub fn builder() -> PairBasisConstructionDriverBuilder<'a, T> {
        PairBasisConstructionDriverBuilder::default()
    }

    fn construct_pair_basis(&mut self) -> Result<(), anyhow::Error> {
        let params = self.parameters;
        log_title("Pair-Basis Construction");
        pairint_output!("");
        params.log_output_display();

        let basis = BasisPair::new(self.systems.clone(), &params.restrictions).map_err(|err| {
            pairint_error!("{err}");
            err
        })?;

        if params.print_kets {
            log_ket_table(&basis);
        }

        let result = PairBasisConstructionResult::builder()
            .basis(basis)
            .build()
            .map_err(|err| format_err!(err))?;
        result.log_output_display();
        self.result = Some(result);
        Ok(())
    }
}

/// Logs the retained pair states as a table.
fn log_ket_table<T: PairScalar>(basis: &BasisPair<T>) {
    let width = basis
        .kets()
        .iter()
        .map(|ket| ket.to_string().chars().count())
        .max()
        .unwrap_or(0)
        .max(8);
    let count_length = basis.number_of_states().max(1).to_string().len().max(1);
    let rule = "┈".repeat(count_length + width + 36);
    log_subtitle("Retained pair states");
    pairint_output!("");
    pairint_output!("{rule}");
    pairint_output!(
        "{:>count_length$}  {:<width$}  {:>16}  {:>6}  {:>7}",
        "#",
        "Pair ket",
        "Energy (au)",
        "m",
        "Parity"
    );
    pairint_output!("{rule}");
    for (i, ket) in basis.kets().iter().enumerate() {
        pairint_output!(
            "{:>count_length$}  {:<width$}  {:>+16.8e}  {:>6}  {:>7}",
            i,
            ket.to_string(),
            ket.energy(),
            ket.m()
                .map(fmt_half_integer)
                .unwrap_or_else(|| "--".to_string()),
            ket.parity().to_string()
        );
    }
    pairint_output!("{rule}");
    pairint_output!("");
}

impl<'a, T: PairScalar> PairIntDriver for PairBasisConstructionDriver<'a, T> {
    type Params = PairBasisConstructionParams;

    type Outcome = PairBasisConstructionResult<T>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No pair-basis construction results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.construct_pair_basis()
    }
}
