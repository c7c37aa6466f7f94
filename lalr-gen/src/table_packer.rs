//! Displacement-table packing (§4.7): turn the dense per-state action and
//! goto rows into a compact shared `table`/`check` pair, the classic
//! technique real yacc-family generators use to keep parser tables small
//! (every state's row would otherwise need `token_count` or
//! `nonterminal_count` entries, almost all of them "error").
//!
//! Each row is placed at the lowest free base offset where none of its
//! non-empty cells collide with an already-occupied `table`/`check` slot,
//! and where the base itself was never handed out to an earlier row (§4.7).
//! `check` records the *key* (symbol or state) each slot was written for —
//! since two different rows can never legitimately share a base, a runtime
//! lookup at `base[row] + key` that finds `check == key` is guaranteed to
//! have been written by `row` itself, not by stray leftover data from an
//! unrelated row that happens to reuse the same absolute offset.

use std::collections::HashSet;

use lalr_core::index::{RuleIndex, StateIndex, StateVec, RULE_INVALID};

use crate::lr0::Lr0Automaton;
use crate::parser_builder::{Action, ParserTables};

pub struct PackedTables {
    pub default_reductions: StateVec<RuleIndex>,
    pub shift_index: StateVec<usize>,
    pub reduce_index: StateVec<usize>,
    /// Indexed by non-terminal local index (`symbol.0 - token_count`).
    pub goto_index: Vec<usize>,
    pub default_goto: Vec<StateIndex>,
    pub table: Vec<i32>,
    pub check: Vec<i32>,
}

const UNUSED: i32 = -1;

pub fn pack_tables(
    automaton: &Lr0Automaton,
    parser: &ParserTables,
    nonterminal_count: usize,
    token_count: usize,
) -> PackedTables {
    let mut table: Vec<i32> = Vec::new();
    let mut check: Vec<i32> = Vec::new();
    // Shared across shift, reduce, and goto rows: a base, once handed to any
    // one of them, is never reused by another (§4.7), even though all three
    // pack into the same `table`/`check` pair.
    let mut used_bases: HashSet<usize> = HashSet::new();

    let default_reductions = compute_default_reductions(parser);

    let shift_rows: Vec<Vec<(usize, i32)>> = parser
        .actions
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|(&sym, &action)| match action {
                    Action::Shift(target) => Some((sym.0, target.0 as i32)),
                    _ => None,
                })
                .collect()
        })
        .collect();

    let reduce_rows: Vec<Vec<(usize, i32)>> = parser
        .actions
        .iter()
        .enumerate()
        .map(|(state, row)| {
            let default = default_reductions[StateIndex(state)];
            row.iter()
                .filter_map(|(&sym, &action)| match action {
                    Action::Reduce(rule) if rule != default => Some((sym.0, -(rule.0 as i32))),
                    _ => None,
                })
                .collect()
        })
        .collect();

    let shift_index = pack_rows(&shift_rows, &mut table, &mut check, &mut used_bases);
    let reduce_index = pack_rows(&reduce_rows, &mut table, &mut check, &mut used_bases);

    let (goto_rows, default_goto) = compute_goto_rows(automaton, nonterminal_count, token_count);
    let goto_index = pack_rows(&goto_rows, &mut table, &mut check, &mut used_bases);

    PackedTables {
        default_reductions,
        shift_index: StateVec(shift_index),
        reduce_index: StateVec(reduce_index),
        goto_index,
        default_goto,
        table,
        check,
    }
}

/// A state's default reduction (§4.6): the rule it reduces by when no other
/// non-suppressed action applies. A state with any shift, or with more than
/// one distinct reduce rule among its actions, has no default (rule 0).
fn compute_default_reductions(parser: &ParserTables) -> StateVec<RuleIndex> {
    let mut out = StateVec::with_capacity(parser.actions.len());
    for row in &parser.actions {
        let has_shift = row.values().any(|a| matches!(a, Action::Shift(_)));
        let mut distinct: Option<RuleIndex> = None;
        let mut more_than_one = false;
        for &action in row.values() {
            if let Action::Reduce(rule) = action {
                match distinct {
                    None => distinct = Some(rule),
                    Some(r) if r != rule => more_than_one = true,
                    _ => {}
                }
            }
        }
        let default = if has_shift || more_than_one { RULE_INVALID } else { distinct.unwrap_or(RULE_INVALID) };
        out.push(default);
    }
    out
}

fn compute_goto_rows(
    automaton: &Lr0Automaton,
    nonterminal_count: usize,
    token_count: usize,
) -> (Vec<Vec<(usize, i32)>>, Vec<StateIndex>) {
    let mut per_nt: Vec<Vec<(usize, StateIndex)>> = vec![Vec::new(); nonterminal_count];
    for (p, state) in automaton.states.iter().enumerate() {
        for &(sym, target) in &state.gotos {
            per_nt[sym.0 - token_count].push((p, target));
        }
    }

    let mut default_goto = vec![StateIndex::default(); nonterminal_count];
    let mut rows = Vec::with_capacity(nonterminal_count);
    for (nt, entries) in per_nt.into_iter().enumerate() {
        let mut counts: Vec<(StateIndex, usize)> = Vec::new();
        for &(_, target) in &entries {
            match counts.iter_mut().find(|(s, _)| *s == target) {
                Some((_, c)) => *c += 1,
                None => counts.push((target, 1)),
            }
        }
        let default = counts.into_iter().max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0))).map(|(s, _)| s);
        if let Some(default) = default {
            default_goto[nt] = default;
        }
        let row: Vec<(usize, i32)> = entries
            .into_iter()
            .filter(|&(_, target)| Some(target) != default)
            .map(|(from_state, target)| (from_state, target.0 as i32))
            .collect();
        rows.push(row);
    }
    (rows, default_goto)
}

/// Packs `rows` into `table`/`check`, returning each row's base offset.
/// Rows are placed widest-first so large rows get first pick of low
/// offsets, which tends to leave smaller gaps for the rows packed after
/// them. `used_bases` is shared across every call against the same
/// `table`/`check` pair so a base can never be handed to two different rows
/// (§4.7), and `0` is reserved out of the search entirely so it can serve as
/// the runtime "this vector was empty" sentinel.
fn pack_rows(
    rows: &[Vec<(usize, i32)>],
    table: &mut Vec<i32>,
    check: &mut Vec<i32>,
    used_bases: &mut HashSet<usize>,
) -> Vec<usize> {
    let mut bases = vec![0usize; rows.len()];
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_key(|&i| std::cmp::Reverse(rows[i].len()));

    for &i in &order {
        let row = &rows[i];
        if row.is_empty() {
            continue;
        }
        let max_key = row.iter().map(|&(k, _)| k).max().unwrap();

        let mut base = 1usize;
        'search: loop {
            if used_bases.contains(&base) {
                base += 1;
                continue 'search;
            }
            for &(key, _) in row {
                let pos = base + key;
                if pos < check.len() && check[pos] != UNUSED {
                    base += 1;
                    continue 'search;
                }
            }
            break;
        }

        let needed = base + max_key + 1;
        if needed > table.len() {
            table.resize(needed, 0);
            check.resize(needed, UNUSED);
        }
        for &(key, val) in row {
            table[base + key] = val;
            check[base + key] = key as i32;
        }
        used_bases.insert(base);
        bases[i] = base;
    }
    bases
}
