//! Grammar validation and symbol classification (§4.2).

use lalr_core::error::{GenError, Result};
use lalr_core::index::SymbolIndex;

use crate::description::{Assoc, GrammarDescription, Production};

/// Per-symbol bookkeeping the rest of the crate needs, derived once from
/// `GrammarDescription` and never mutated again.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: Vec<u8>,
    pub precedence: u32,
    pub assoc: Assoc,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    pub token_count: usize,
    pub symbol_count: usize,
    pub start_symbol: SymbolIndex,
    pub symbols: Vec<SymbolInfo>,
    /// Index `i` is the production list of non-terminal `token_count + i`.
    pub productions: Vec<Vec<Production>>,
}

impl SymbolTable {
    /// Validates `desc` and classifies its symbols (§4.2 invariants).
    pub fn build(desc: &GrammarDescription) -> Result<Self> {
        if desc.token_count == 0 {
            return Err(GenError::InvalidSpecification(
                "grammar must declare at least one token (the end marker)".into(),
            ));
        }
        if desc.symbol_count != desc.elements.len() {
            return Err(GenError::InvalidSpecification(format!(
                "symbol_count {} does not match elements.len() {}",
                desc.symbol_count,
                desc.elements.len()
            )));
        }
        if desc.token_count > desc.symbol_count {
            return Err(GenError::InvalidSpecification(
                "token_count exceeds symbol_count".into(),
            ));
        }
        if desc.symbol_count - desc.token_count == 0 {
            return Err(GenError::InvalidSpecification(
                "grammar must declare at least one non-terminal".into(),
            ));
        }

        let mut symbols = Vec::with_capacity(desc.symbol_count);
        let mut productions = Vec::with_capacity(desc.symbol_count - desc.token_count);
        let mut start_symbol = None;

        for (i, el) in desc.elements.iter().enumerate() {
            let sym = SymbolIndex(i);
            let is_terminal = i < desc.token_count;

            match (&el.productions, is_terminal) {
                (Some(_), true) => {
                    return Err(GenError::InvalidSpecification(format!(
                        "symbol {:?} is classified as a token but declares productions",
                        String::from_utf8_lossy(&el.name)
                    )));
                }
                (None, false) => {
                    return Err(GenError::InvalidSpecification(format!(
                        "non-terminal {:?} has no productions",
                        String::from_utf8_lossy(&el.name)
                    )));
                }
                _ => {}
            }

            if let Some(prods) = &el.productions {
                if prods.is_empty() {
                    return Err(GenError::InvalidSpecification(format!(
                        "non-terminal {:?} has an empty production list",
                        String::from_utf8_lossy(&el.name)
                    )));
                }
                for p in prods {
                    for &rhs_sym in &p.rhs {
                        if rhs_sym.0 >= desc.symbol_count {
                            return Err(GenError::InvalidSpecification(format!(
                                "production of {:?} references out-of-range symbol {}",
                                String::from_utf8_lossy(&el.name),
                                rhs_sym.0
                            )));
                        }
                    }
                }
                productions.push(prods.clone());
            }

            if el.is_start {
                if is_terminal {
                    return Err(GenError::InvalidSpecification(
                        "the start symbol must be a non-terminal".into(),
                    ));
                }
                if start_symbol.replace(sym).is_some() {
                    return Err(GenError::InvalidSpecification(
                        "grammar declares more than one start symbol".into(),
                    ));
                }
            }

            symbols.push(SymbolInfo {
                name: el.name.clone(),
                precedence: el.precedence,
                assoc: el.assoc,
            });
        }

        // If no symbol is marked as the start symbol, the first non-terminal
        // is chosen (§4.2) rather than erroring.
        let start_symbol = start_symbol.unwrap_or(SymbolIndex(desc.token_count));

        Ok(SymbolTable {
            token_count: desc.token_count,
            symbol_count: desc.symbol_count,
            start_symbol,
            symbols,
            productions,
        })
    }

    pub fn is_terminal(&self, sym: SymbolIndex) -> bool {
        sym.0 < self.token_count
    }

    pub fn nonterminal_count(&self) -> usize {
        self.symbol_count - self.token_count
    }

    /// Local 0-based index of a non-terminal within `productions`.
    pub fn nonterminal_local(&self, sym: SymbolIndex) -> usize {
        debug_assert!(!self.is_terminal(sym));
        sym.0 - self.token_count
    }

    pub fn name(&self, sym: SymbolIndex) -> &[u8] {
        &self.symbols[sym.0].name
    }
}
