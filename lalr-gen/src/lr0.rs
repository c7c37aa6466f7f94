//! LR(0) item-set automaton construction (§4.3).
//!
//! Grounded on the `lr0.c` port in
//! `examples/other_examples/ca5b8da6_hulunbier-racc__src-lr0.rs.rs`
//! (itself a port of byacc's state-construction core): build a state's
//! closure by unioning `FirstDerives` rows for every kernel item whose
//! next symbol is a non-terminal, group the closure by the symbol after
//! the dot, and dedupe new kernels against states sharing the same first
//! kernel item.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use lalr_core::error::{GenError, Result};
use lalr_core::index::{ItemIndex, RuleIndex, StateIndex, StateVec, SymbolIndex, RULE_INVALID};

use crate::item_model::{ItemModel, ItemSlot};

/// A state is never allowed to grow past this many states; existing
/// grammars (even large generated ones) stay several orders of magnitude
/// below it, so hitting it means a runaway/cyclic input rather than a
/// legitimately large grammar.
const LR0_STATE_LIMIT: usize = 1_000_000;

#[derive(Debug, Clone, Default)]
pub struct Lr0State {
    /// Sorted, deduplicated. Identifies the state.
    pub kernel_items: Vec<ItemIndex>,
    /// Sorted, deduplicated closure of `kernel_items`.
    pub items: Vec<ItemIndex>,
    /// Transitions on terminals, sorted by symbol.
    pub shifts: Vec<(SymbolIndex, StateIndex)>,
    /// Transitions on non-terminals, sorted by symbol.
    pub gotos: Vec<(SymbolIndex, StateIndex)>,
    /// Rules completed in this state, sorted ascending. `RULE_START`
    /// appearing here marks the accepting state, not an ordinary reduction.
    pub reductions: Vec<RuleIndex>,
}

#[derive(Debug, Clone)]
pub struct Lr0Automaton {
    pub states: StateVec<Lr0State>,
    pub start_state: StateIndex,
}

pub fn compute_lr0(model: &ItemModel, token_count: usize) -> Result<Lr0Automaton> {
    let mut states: StateVec<Lr0State> = StateVec::new();
    let mut seen: HashMap<ItemIndex, Vec<StateIndex>> = HashMap::new();
    let mut queue: VecDeque<StateIndex> = VecDeque::new();

    let initial_kernel = vec![model.rules[lalr_core::index::RULE_START].rhs_start];
    let (start_state, _) = get_state(&mut states, &mut seen, initial_kernel)?;
    queue.push_back(start_state);

    while let Some(state_idx) = queue.pop_front() {
        let kernel = states[state_idx].kernel_items.clone();
        let closure_items = closure(&kernel, model, token_count);

        let mut by_symbol: IndexMap<SymbolIndex, Vec<ItemIndex>> = IndexMap::new();
        let mut reductions = Vec::new();
        for &item in &closure_items {
            match model.items[item] {
                ItemSlot::Symbol(sym) => {
                    by_symbol.entry(sym).or_default().push(ItemIndex(item.0 + 1));
                }
                ItemSlot::EndOfRule(rule) => {
                    if rule != RULE_INVALID {
                        reductions.push(rule);
                    }
                }
            }
        }
        reductions.sort_unstable();
        reductions.dedup();

        let mut symbols: Vec<SymbolIndex> = by_symbol.keys().copied().collect();
        symbols.sort_unstable();

        let mut shifts = Vec::new();
        let mut gotos = Vec::new();
        for sym in symbols {
            let mut next_kernel = by_symbol.swap_remove(&sym).unwrap();
            next_kernel.sort_unstable();
            next_kernel.dedup();
            let (next_state, is_new) = get_state(&mut states, &mut seen, next_kernel)?;
            if is_new {
                queue.push_back(next_state);
            }
            if sym.0 < token_count {
                shifts.push((sym, next_state));
            } else {
                gotos.push((sym, next_state));
            }
        }

        let state = &mut states[state_idx];
        state.items = closure_items;
        state.shifts = shifts;
        state.gotos = gotos;
        state.reductions = reductions;
    }

    Ok(Lr0Automaton { states, start_state })
}

/// Expands `kernel` into the full closure item set (§4.3 Closure): for
/// every kernel item whose next symbol is a non-terminal, union in
/// `FirstDerives[nt]` as a set of rule numbers, then instantiate each
/// flagged rule's initial item (dot before its first symbol).
fn closure(kernel: &[ItemIndex], model: &ItemModel, token_count: usize) -> Vec<ItemIndex> {
    let mut rule_set = vec![false; model.rules.len()];
    let mut any = false;
    for &item in kernel {
        if let ItemSlot::Symbol(sym) = model.items[item] {
            if sym.0 >= token_count {
                let local = sym.0 - token_count;
                for r in model.first_derives.iter_row(local) {
                    rule_set[r] = true;
                }
                any = true;
            }
        }
    }

    let mut items = kernel.to_vec();
    if any {
        for (r, &flag) in rule_set.iter().enumerate() {
            if flag {
                items.push(model.rules[RuleIndex(r)].rhs_start);
            }
        }
    }
    items.sort_unstable();
    items.dedup();
    items
}

/// Looks up `kernel` among previously created states (keyed by their first
/// kernel item, same as RACC's `get_state`), creating a new one if no
/// candidate's kernel matches exactly. Returns `(state, true)` when a new
/// state was created.
fn get_state(
    states: &mut StateVec<Lr0State>,
    seen: &mut HashMap<ItemIndex, Vec<StateIndex>>,
    kernel: Vec<ItemIndex>,
) -> Result<(StateIndex, bool)> {
    let key = kernel[0];
    if let Some(candidates) = seen.get(&key) {
        for &candidate in candidates {
            if states[candidate].kernel_items == kernel {
                return Ok((candidate, false));
            }
        }
    }
    if states.len() >= LR0_STATE_LIMIT {
        return Err(GenError::TooManyItems { limit: LR0_STATE_LIMIT, requested: states.len() + 1 });
    }
    let idx = states.push(Lr0State { kernel_items: kernel, ..Default::default() });
    seen.entry(key).or_default().push(idx);
    Ok((idx, true))
}
