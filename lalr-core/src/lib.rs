//! Shared primitives for the LALR(1) table generator.
//!
//! This crate carries no algorithm: it is the "runtime" layer that
//! `lalr-gen` builds on, in the same spirit as `rustemort` sits under
//! `rustemo-tools` — index newtypes over owned vectors, a word-aligned 2-D
//! bitmap with the two Warshall closures the construction needs, and the
//! error taxonomy every stage of the pipeline reports through.

pub mod bitset;
pub mod error;
pub mod index;

pub use bitset::Bitset2D;
pub use error::{GenError, Result};
