//! A variety of utility types and functions for use across the crates in this
//! repo.

// for benchmarks
#[cfg(test)]
use criterion as _;

pub mod fuzzy;
pub mod text;
