//! LALR(1) parser table generation: LR(0) automaton construction,
//! DeRemer/Pennello lookahead computation, conflict resolution and
//! displacement-table packing, behind the single [`generate`] entry point.

mod description;
mod digraph;
mod driver;
mod item_model;
mod lalr;
mod lr0;
mod parser_builder;
mod symbol_table;
mod table_packer;

pub use description::{Assoc, GeneratedTables, GrammarDescription, Production, SymbolElement};
pub use driver::generate;
pub use lalr_core::error::{GenError, Result};
