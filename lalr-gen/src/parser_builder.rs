//! Action-table construction and conflict resolution (§4.6).
//!
//! Grounded on rustemo's `table.rs` for the shape of the problem (grouping
//! candidate actions per state by lookahead symbol before deciding between
//! them) even though rustemo's own table.rs builds a GLR table; the
//! resolution rule itself (precedence/associativity, falling back to
//! shift-wins / earlier-rule-wins) is yacc's.

use indexmap::IndexMap;
use lalr_core::index::{RuleIndex, StateIndex, SymbolIndex};

use crate::description::Assoc;
use crate::item_model::ItemModel;
use crate::lalr::LalrTables;
use crate::lr0::Lr0Automaton;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateIndex),
    Reduce(RuleIndex),
    Accept,
}

#[derive(Debug, Clone)]
pub struct ParserTables {
    /// `actions[state]` maps a lookahead terminal to the chosen action,
    /// insertion-ordered by first appearance (shifts discovered before
    /// reduces, matching the order state construction visits them).
    pub actions: Vec<IndexMap<SymbolIndex, Action>>,
    pub gotos: Vec<IndexMap<SymbolIndex, StateIndex>>,
    pub shift_reduce_conflicts: usize,
    pub reduce_reduce_conflicts: usize,
}

pub fn build_parser_tables(model: &ItemModel, automaton: &Lr0Automaton, lalr: &LalrTables) -> ParserTables {
    let mut actions: Vec<IndexMap<SymbolIndex, Action>> = Vec::with_capacity(automaton.states.len());
    let mut gotos: Vec<IndexMap<SymbolIndex, StateIndex>> = Vec::with_capacity(automaton.states.len());
    let mut shift_reduce_conflicts = 0usize;
    let mut reduce_reduce_conflicts = 0usize;

    for (p, state) in automaton.states.iter().enumerate() {
        let mut row: IndexMap<SymbolIndex, Action> = IndexMap::new();
        for &(sym, target) in &state.shifts {
            row.insert(sym, Action::Shift(target));
        }

        for &rule in &state.reductions {
            if rule == lalr_core::index::RULE_START {
                row.insert(SymbolIndex(0), Action::Accept);
                continue;
            }
            for t in lalr.lookahead_set(StateIndex(p), rule) {
                let sym = SymbolIndex(t);
                match row.get(&sym).copied() {
                    None => {
                        row.insert(sym, Action::Reduce(rule));
                    }
                    Some(Action::Shift(_)) => {
                        let (rule_prec, rule_assoc) = (model.rules[rule].precedence, model.rules[rule].assoc);
                        let (shift_prec, _) = sym_precedence(model, sym);
                        match resolve_shift_reduce(rule_prec, rule_assoc, shift_prec) {
                            Resolution::KeepShift => {}
                            Resolution::TakeReduce => {
                                row.insert(sym, Action::Reduce(rule));
                            }
                            Resolution::Conflict => {
                                shift_reduce_conflicts += 1;
                            }
                        }
                    }
                    Some(Action::Reduce(existing)) => {
                        if existing != rule {
                            reduce_reduce_conflicts += 1;
                            if rule.0 < existing.0 {
                                row.insert(sym, Action::Reduce(rule));
                            }
                        }
                    }
                    Some(Action::Accept) => {
                        // Accept-vs-reduce on end-of-input in the final state (§4.6):
                        // counted as a shift/reduce conflict, reduce suppressed noisily.
                        shift_reduce_conflicts += 1;
                    }
                }
            }
        }

        let mut goto_row: IndexMap<SymbolIndex, StateIndex> = IndexMap::new();
        for &(sym, target) in &state.gotos {
            goto_row.insert(sym, target);
        }

        actions.push(row);
        gotos.push(goto_row);
    }

    ParserTables { actions, gotos, shift_reduce_conflicts, reduce_reduce_conflicts }
}

enum Resolution {
    KeepShift,
    TakeReduce,
    Conflict,
}

/// Resolves a shift/reduce conflict using precedence and associativity
/// (§4.6): the side with the higher precedence wins outright; equal
/// precedence defers to the rule's associativity (`Left` reduces, `Right`
/// shifts, `Non` is a hard error surfaced as a conflict); no precedence on
/// either side is reported as an ordinary conflict and resolved in favor
/// of the shift, matching yacc's traditional default.
fn resolve_shift_reduce(rule_prec: u32, rule_assoc: Assoc, shift_prec: u32) -> Resolution {
    if rule_prec == 0 || shift_prec == 0 {
        return Resolution::Conflict;
    }

    use std::cmp::Ordering;
    match rule_prec.cmp(&shift_prec) {
        Ordering::Greater => Resolution::TakeReduce,
        Ordering::Less => Resolution::KeepShift,
        Ordering::Equal => match rule_assoc {
            Assoc::Left => Resolution::TakeReduce,
            Assoc::Right => Resolution::KeepShift,
            Assoc::Non | Assoc::None => Resolution::Conflict,
        },
    }
}

fn sym_precedence(model: &ItemModel, sym: SymbolIndex) -> (u32, Assoc) {
    model.terminal_precedence.get(sym.0).copied().unwrap_or((0, Assoc::None))
}
