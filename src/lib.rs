//! # pairint: pair bases for interacting Rydberg atoms
//!
//! `pairint` builds the two-atom product bases in which pair-interaction Hamiltonians of Rydberg
//! atoms are expressed, with the following capabilities:
//! - scalar parameters that are constant, listed or swept over a range, with unit conversion into
//!   atomic units,
//! - validated per-atom constraint models of quantum-number bounds, energy windows, external
//!   fields and states of interest, for single-channel and multi-channel atoms,
//! - expansion of field sweeps into concrete field configurations,
//! - restricted product bases of two diagonalised atom systems, pruned by total magnetic quantum
//!   number, product of parities and total energy, and
//! - amplitudes, overlaps and operator matrix elements of pair states in such a basis.
//!
//! Atomic kets, their operator matrices and eigensolvers are supplied by an external engine
//! through the [`system::AtomSystem`] and [`system::Diagonalizer`] traits.
//!
//! ## Getting started
//!
//! A calculation is configured by a YAML file read into an [`interfaces::input::Input`]. For
//! each field configuration of the atom models, the engine diagonalises one
//! [`system::atom::SystemAtom`] per atom, and the
//! [`drivers::pair_basis_construction::PairBasisConstructionDriver`] combines the two systems
//! into a [`basis::pair::BasisPair`].
//!
//! Both real (`f64`) and complex (`Complex<f64>`) representations are supported; which one is
//! needed follows from [`model::atom::ModelAtom::scalar_kind`].
//!
//! ## Logging
//!
//! Main output is written to the `pairint-output` log target, and diagnostics to the crate's own
//! target at the debug level. Any [`log`] implementation can be used to collect them.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions.

pub mod auxiliary;
pub mod basis;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod model;
pub mod operator;
pub mod system;
pub mod units;
