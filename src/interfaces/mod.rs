//! Interfaces between `pairint` and its callers.

pub mod input;
