//! Descriptors of individual atomic states named inside an atom model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::io::format::fmt_half_integer;
use crate::model::atom::ModelAtomKind;
use crate::model::parameter::InvalidParameterError;
use crate::model::{is_half_integer, is_integer, SpeciesMismatchError};

/// Plain record describing a state of interest as read from a configuration. The species may be
/// omitted, in which case it is inherited from the enclosing atom model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelStateAtomInput {
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub n: Option<f64>,
    #[serde(default)]
    pub nu: Option<f64>,
    #[serde(default)]
    pub l: Option<f64>,
    #[serde(default)]
    pub s: Option<f64>,
    #[serde(default)]
    pub j: Option<f64>,
    #[serde(default)]
    pub f: Option<f64>,
    #[serde(default)]
    pub m: Option<f64>,
}

impl ModelStateAtomInput {
    /// Collects every violation of this descriptor against its parent's species and channel
    /// kind. Each violation is either a [`SpeciesMismatchError`] or an
    /// [`InvalidParameterError`].
    pub(crate) fn violations(
        &self,
        parent_species: &str,
        kind: &ModelAtomKind,
        label: &str,
    ) -> Vec<anyhow::Error> {
        let mut violations: Vec<anyhow::Error> = vec![];
        if let Some(species) = self.species.as_ref() {
            if species != parent_species {
                violations.push(
                    SpeciesMismatchError(format!(
                        "{label} has species `{species}`, but its atom has species \
                        `{parent_species}`"
                    ))
                    .into(),
                );
            }
        }

        let mut check = |valid: bool, description: &str| {
            if !valid {
                violations.push(InvalidParameterError(format!("{label}: {description}")).into());
            }
        };

        if let Some(nu) = self.nu {
            check(nu > 0.0, "`nu` must be positive");
        }
        if let Some(l) = self.l {
            check(l >= 0.0, "`l` must be non-negative");
        }
        if let Some(s) = self.s {
            check(s >= 0.0, "`s` must be non-negative");
        }
        if let Some(j) = self.j {
            check(j >= 0.0, "`j` must be non-negative");
        }
        match kind {
            ModelAtomKind::SingleChannel(_) => {
                if let Some(n) = self.n {
                    check(n >= 1.0 && is_integer(n), "`n` must be a positive integer");
                }
                if let Some(l) = self.l {
                    check(is_integer(l), "`l` must be an integer");
                }
                if let Some(s) = self.s {
                    check(is_half_integer(s), "`s` must be a half-integer");
                }
                if let Some(j) = self.j {
                    check(is_half_integer(j), "`j` must be a half-integer");
                }
                check(
                    self.f.is_none(),
                    "`f` is not defined for single-channel atoms",
                );
            }
            ModelAtomKind::MultiChannel(_) => {
                if let Some(n) = self.n {
                    check(n > 0.0, "`n` must be positive");
                }
                if let Some(f) = self.f {
                    check(f >= 0.0 && is_half_integer(f), "`f` must be a non-negative half-integer");
                }
            }
        }
        if let Some(m) = self.m {
            check(is_half_integer(m), "`m` must be a half-integer");
        }
        violations
    }
}

/// A validated state descriptor whose species always agrees with its atom model. It is only
/// obtained through [`crate::model::atom::ModelAtom`], and serialised as a
/// [`ModelStateAtomInput`].
#[derive(Clone, Debug, PartialEq)]
pub struct ModelStateAtom {
    species: String,
    n: Option<f64>,
    nu: Option<f64>,
    l: Option<f64>,
    s: Option<f64>,
    j: Option<f64>,
    f: Option<f64>,
    m: Option<f64>,
}

impl ModelStateAtom {
    /// Resolves the species of an already validated record.
    pub(crate) fn resolve(input: &ModelStateAtomInput, parent_species: &str) -> Self {
        Self {
            species: input
                .species
                .clone()
                .unwrap_or_else(|| parent_species.to_string()),
            n: input.n,
            nu: input.nu,
            l: input.l,
            s: input.s,
            j: input.j,
            f: input.f,
            m: input.m,
        }
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn n(&self) -> Option<f64> {
        self.n
    }

    pub fn nu(&self) -> Option<f64> {
        self.nu
    }

    pub fn l(&self) -> Option<f64> {
        self.l
    }

    pub fn s(&self) -> Option<f64> {
        self.s
    }

    pub fn j(&self) -> Option<f64> {
        self.j
    }

    pub fn f(&self) -> Option<f64> {
        self.f
    }

    pub fn m(&self) -> Option<f64> {
        self.m
    }
}

impl From<&ModelStateAtom> for ModelStateAtomInput {
    fn from(state: &ModelStateAtom) -> Self {
        Self {
            species: Some(state.species.clone()),
            n: state.n,
            nu: state.nu,
            l: state.l,
            s: state.s,
            j: state.j,
            f: state.f,
            m: state.m,
        }
    }
}

impl fmt::Display for ModelStateAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![];
        let labelled = [
            ("n", self.n),
            ("nu", self.nu),
            ("l", self.l),
            ("s", self.s),
            ("j", self.j),
            ("f", self.f),
            ("m", self.m),
        ];
        for (name, value) in labelled {
            if let Some(value) = value {
                parts.push(format!("{name}={}", fmt_half_integer(value)));
            }
        }
        write!(f, "{}({})", self.species, parts.join(", "))
    }
}
