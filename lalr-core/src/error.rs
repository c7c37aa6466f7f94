//! Error taxonomy (§6 "Error taxonomy", §7 Error handling design).
//!
//! Mirrors the three-way split the original construction exposes. `NoMemory`
//! has no direct Rust analogue (allocation failure isn't something safe code
//! catches) so it is reserved for the one place an arithmetic overflow would
//! otherwise panic: computing a table size or bucket count that has
//! outgrown `usize`. `TooManyItems` is raised explicitly by capacity checks
//! in `Lr0Builder`/`TablePacker`; `InvalidSpecification` is raised by the
//! grammar validation pass in `SymbolTable`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GenError {
    /// An internal size computation would overflow `usize`.
    #[error("allocation size overflow while building the table")]
    NoMemory,

    /// The grammar description failed validation (§4.2).
    #[error("invalid grammar specification: {0}")]
    InvalidSpecification(String),

    /// A state, goto, or packed-table index exceeded an implementation cap.
    #[error("too many items: requested {requested}, limit is {limit}")]
    TooManyItems { limit: usize, requested: usize },
}

pub type Result<T> = std::result::Result<T, GenError>;
