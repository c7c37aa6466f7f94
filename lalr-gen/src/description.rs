//! The generator's external interface (§6): `GrammarDescription` in,
//! `GeneratedTables` out. Everything else in this crate is a private
//! implementation detail of the path between the two.

use lalr_core::index::{RuleIndex, StateVec, SymbolIndex};

/// Associativity of a symbol or a rule (§3 Symbol, §3 Rule).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Assoc {
    Left,
    Right,
    /// `%nonassoc` — using the operator twice at the same precedence level
    /// is a hard error at parse time, not just "pick one arbitrarily".
    Non,
    #[default]
    None,
}

/// One production's right-hand side, in declaration order.
///
/// `precedence` is the production's own precedence override. `None` means
/// "inherit from the rule's last terminal" (§4.2); `Some(p)` is an explicit
/// override, with `p == 0` meaning "explicitly no precedence" regardless of
/// what the rule's last terminal carries (see DESIGN.md for why this
/// doesn't need a `%prec <token>`-style symbol reference).
#[derive(Debug, Clone)]
pub struct Production {
    pub rhs: Vec<SymbolIndex>,
    pub precedence: Option<u32>,
}

impl Production {
    pub fn new(rhs: Vec<SymbolIndex>) -> Self {
        Production { rhs, precedence: None }
    }

    pub fn with_precedence(rhs: Vec<SymbolIndex>, precedence: u32) -> Self {
        Production { rhs, precedence: Some(precedence) }
    }
}

/// One entry of `GrammarDescription::elements`, indexed by `SymbolIndex`.
#[derive(Debug, Clone)]
pub struct SymbolElement {
    pub name: Vec<u8>,
    /// 0 means "no precedence declared".
    pub precedence: u32,
    pub assoc: Assoc,
    pub is_start: bool,
    /// `None` for terminals. `Some(productions)` for non-terminals — always
    /// non-empty once validated (§4.2: "every non-terminal must have at
    /// least one").
    pub productions: Option<Vec<Production>>,
}

impl SymbolElement {
    pub fn terminal(name: impl Into<Vec<u8>>) -> Self {
        SymbolElement {
            name: name.into(),
            precedence: 0,
            assoc: Assoc::None,
            is_start: false,
            productions: None,
        }
    }

    pub fn terminal_with_prec(name: impl Into<Vec<u8>>, precedence: u32, assoc: Assoc) -> Self {
        SymbolElement {
            name: name.into(),
            precedence,
            assoc,
            is_start: false,
            productions: None,
        }
    }

    pub fn nonterminal(name: impl Into<Vec<u8>>, productions: Vec<Production>) -> Self {
        SymbolElement {
            name: name.into(),
            precedence: 0,
            assoc: Assoc::None,
            is_start: false,
            productions: Some(productions),
        }
    }

    pub fn start(mut self) -> Self {
        self.is_start = true;
        self
    }
}

/// The generator's sole input (§6).
#[derive(Debug, Clone)]
pub struct GrammarDescription {
    pub token_count: usize,
    pub symbol_count: usize,
    pub elements: Vec<SymbolElement>,
    pub expected_shift_reduce_conflicts: usize,
    pub expected_reduce_reduce_conflicts: usize,
    pub variable_prefix: String,
    pub output_file_name: String,
}

impl GrammarDescription {
    pub fn new(token_count: usize, elements: Vec<SymbolElement>) -> Self {
        let symbol_count = elements.len();
        GrammarDescription {
            token_count,
            symbol_count,
            elements,
            expected_shift_reduce_conflicts: 0,
            expected_reduce_reduce_conflicts: 0,
            variable_prefix: String::new(),
            output_file_name: String::new(),
        }
    }

    pub fn with_expected_conflicts(mut self, shift_reduce: usize, reduce_reduce: usize) -> Self {
        self.expected_shift_reduce_conflicts = shift_reduce;
        self.expected_reduce_reduce_conflicts = reduce_reduce;
        self
    }
}

/// The generator's sole output (§6). Immutable once returned.
#[derive(Debug, Clone)]
pub struct GeneratedTables {
    /// Indexed from rule 3, offset so the user-visible start rule is at 0.
    pub left_side: Vec<SymbolIndex>,
    /// Indexed from rule 3, offset the same way as `left_side`.
    pub rule_length: Vec<usize>,
    pub default_reductions: StateVec<RuleIndex>,
    pub shift_index: StateVec<usize>,
    pub reduce_index: StateVec<usize>,
    /// Indexed by non-terminal (0 = first non-terminal, i.e. `symbol.0 -
    /// token_count`).
    pub goto_index: Vec<usize>,
    pub default_goto: Vec<lalr_core::index::StateIndex>,
    pub table: Vec<i32>,
    pub check: Vec<i32>,
    /// Display name per symbol, indexed by `SymbolIndex`.
    pub names: Vec<Vec<u8>>,
    /// `"L : R0 R1 ..."` diagnostic strings, one per real rule (3..).
    pub rules: Vec<String>,
    pub final_state: lalr_core::index::StateIndex,
    pub start_rule: RuleIndex,
    pub last_token: usize,
    pub undefined_token: usize,
    pub table_size: usize,
    /// Actual minus expected (§4.6, §7) — may be negative if the caller
    /// over-declared `expected_*_conflicts`.
    pub shift_reduce_conflicts: isize,
    pub reduce_reduce_conflicts: isize,
    pub unused_rules: Vec<RuleIndex>,
}
