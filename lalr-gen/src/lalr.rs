//! DeRemer/Pennello LALR(1) lookahead computation (§4.4, §4.5).
//!
//! Three relations, each built from the LR(0) automaton and the one shared
//! `digraph` traversal in [`crate::digraph`]:
//!
//! - `reads`: propagates terminals a goto transition can be immediately
//!   followed by (`Read`), threading through nullable non-terminal gotos.
//! - `includes`: propagates `Read` sets up through productions whose
//!   nonterminal occurrence is followed only by nullable symbols (`Follow`).
//! - `lookback`: a plain union (no cycles, no second traversal needed) from
//!   each reduction back to the goto node whose `Follow` set is its
//!   lookahead.

use std::collections::HashMap;

use lalr_core::bitset::Bitset2D;
use lalr_core::index::{GotoIndex, GotoVec, RuleIndex, StateIndex, SymbolIndex};

use crate::item_model::{ItemModel, ItemSlot};
use crate::lr0::Lr0Automaton;

#[derive(Debug, Clone, Copy)]
pub struct GotoEntry {
    pub from_state: StateIndex,
    pub nonterm: SymbolIndex,
    pub to_state: StateIndex,
}

/// The computed LALR lookahead tables, keyed for `parser_builder` to query
/// directly rather than re-deriving anything from the automaton.
pub struct LalrTables {
    pub gotos: GotoVec<GotoEntry>,
    pub goto_index_of: HashMap<(StateIndex, SymbolIndex), GotoIndex>,
    /// `reduction_index_of[(state, rule)]` indexes a row of `lookahead`.
    pub reduction_index_of: HashMap<(StateIndex, RuleIndex), usize>,
    pub lookahead: Bitset2D,
    pub token_count: usize,
}

impl LalrTables {
    pub fn lookahead_set(&self, state: StateIndex, rule: RuleIndex) -> impl Iterator<Item = usize> + '_ {
        let row = self.reduction_index_of[&(state, rule)];
        self.lookahead.iter_row(row)
    }
}

pub fn compute_lalr(model: &ItemModel, automaton: &Lr0Automaton, token_count: usize) -> LalrTables {
    let gotos = enumerate_gotos(automaton);
    let goto_index_of: HashMap<(StateIndex, SymbolIndex), GotoIndex> = gotos
        .iter()
        .enumerate()
        .map(|(i, g)| ((g.from_state, g.nonterm), GotoIndex(i)))
        .collect();

    let transitions = build_transition_map(automaton);
    let rule_origins = states_with_rule_start(model, automaton);

    let read = compute_read(model, automaton, &gotos, &goto_index_of, token_count);
    let mut follow = read.clone();
    let includes_edges = build_includes_edges(model, &rule_origins, &transitions, &goto_index_of, token_count);
    crate::digraph::traverse(gotos.len(), &includes_edges, &mut follow);

    let (reduction_index_of, lookahead) =
        compute_lookback(model, automaton, &rule_origins, &transitions, &goto_index_of, &follow, token_count);

    LalrTables { gotos, goto_index_of, reduction_index_of, lookahead, token_count }
}

fn enumerate_gotos(automaton: &Lr0Automaton) -> GotoVec<GotoEntry> {
    let mut gotos: GotoVec<GotoEntry> = GotoVec::new();
    for (p, state) in automaton.states.iter().enumerate() {
        for &(sym, target) in &state.gotos {
            gotos.push(GotoEntry { from_state: StateIndex(p), nonterm: sym, to_state: target });
        }
    }
    gotos
}

fn build_transition_map(automaton: &Lr0Automaton) -> HashMap<(StateIndex, SymbolIndex), StateIndex> {
    let mut map = HashMap::new();
    for (p, state) in automaton.states.iter().enumerate() {
        for &(sym, target) in state.shifts.iter().chain(state.gotos.iter()) {
            map.insert((StateIndex(p), sym), target);
        }
    }
    map
}

/// For every rule, the states whose closure contains that rule's initial
/// (dot-before-first-symbol) item — the valid "origin" states a reduction's
/// lookback can start walking `rhs` from.
fn states_with_rule_start(model: &ItemModel, automaton: &Lr0Automaton) -> HashMap<RuleIndex, Vec<StateIndex>> {
    let item_to_rule: HashMap<_, _> = model
        .rules
        .iter()
        .enumerate()
        .map(|(r, rule)| (rule.rhs_start, RuleIndex(r)))
        .collect();

    let mut origins: HashMap<RuleIndex, Vec<StateIndex>> = HashMap::new();
    for (p, state) in automaton.states.iter().enumerate() {
        for &item in &state.items {
            if let Some(&rule) = item_to_rule.get(&item) {
                origins.entry(rule).or_default().push(StateIndex(p));
            }
        }
    }
    origins
}

fn simulate(
    mut state: StateIndex,
    symbols: &[SymbolIndex],
    transitions: &HashMap<(StateIndex, SymbolIndex), StateIndex>,
) -> StateIndex {
    for &sym in symbols {
        state = *transitions
            .get(&(state, sym))
            .expect("item_model guarantees every prefix of a reachable rule has a transition");
    }
    state
}

/// `Read(p,A) = DR(p,A) U { Read(q,B) | (p,A) reads (q,B) }`: direct reads
/// seed `follow`'s rows, the `reads` edges (nullable-gated nonterminal
/// chaining) do the propagating.
fn compute_read(
    model: &ItemModel,
    automaton: &Lr0Automaton,
    gotos: &GotoVec<GotoEntry>,
    goto_index_of: &HashMap<(StateIndex, SymbolIndex), GotoIndex>,
    token_count: usize,
) -> Bitset2D {
    let mut read = Bitset2D::new(gotos.len(), token_count);
    let mut edges = vec![Vec::new(); gotos.len()];

    for (i, g) in gotos.iter().enumerate() {
        for &(sym, _) in &automaton.states[g.to_state].shifts {
            read.set(i, sym.0);
        }
        for &(sym, _) in &automaton.states[g.to_state].gotos {
            if model.nullable[sym.0 - token_count] {
                if let Some(&g2) = goto_index_of.get(&(g.to_state, sym)) {
                    edges[i].push(g2.0);
                }
            }
        }
    }

    // The start goto (state 0, shifting the caller's declared start symbol
    // as part of the augmenting rule S' -> S) additionally has end-of-input
    // in its initial follow (§3, §4.4) — nothing else ever seeds this bit,
    // since no real shift or reduction ever produces terminal 0.
    let start_symbol = model.items[model.rules[lalr_core::index::RULE_START].rhs_start]
        .symbol()
        .expect("augmenting rule's right-hand side is a single symbol");
    if let Some(&start_goto) = goto_index_of.get(&(automaton.start_state, start_symbol)) {
        read.set(start_goto.0, 0);
    }

    crate::digraph::traverse(gotos.len(), &edges, &mut read);
    read
}

fn build_includes_edges(
    model: &ItemModel,
    rule_origins: &HashMap<RuleIndex, Vec<StateIndex>>,
    transitions: &HashMap<(StateIndex, SymbolIndex), StateIndex>,
    goto_index_of: &HashMap<(StateIndex, SymbolIndex), GotoIndex>,
    token_count: usize,
) -> Vec<Vec<usize>> {
    let mut edges = vec![Vec::new(); goto_index_of.len()];

    for (r, rule) in model.rules.iter().enumerate() {
        if r < lalr_core::index::FIRST_USER_RULE {
            continue;
        }
        let rhs = &model.items.0[rule.rhs_start.0..rule.rhs_start.0 + rule.rhs_len];
        let Some(origins) = rule_origins.get(&RuleIndex(r)) else { continue };

        for (i, slot) in rhs.iter().enumerate() {
            let ItemSlot::Symbol(x) = *slot else { unreachable!("rhs slots are always symbols") };
            if x.0 < token_count {
                continue;
            }
            let gamma = &rhs[i + 1..];
            let gamma_nullable = gamma.iter().all(|s| match s {
                ItemSlot::Symbol(sym) if sym.0 >= token_count => model.nullable[sym.0 - token_count],
                _ => false,
            });
            if !gamma_nullable {
                continue;
            }

            let beta: Vec<SymbolIndex> = rhs[..i]
                .iter()
                .map(|s| match s {
                    ItemSlot::Symbol(sym) => *sym,
                    ItemSlot::EndOfRule(_) => unreachable!(),
                })
                .collect();

            for &p_prime in origins {
                let p = simulate(p_prime, &beta, transitions);
                if let Some(&g_target) = goto_index_of.get(&(p, x)) {
                    if let Some(&g_source) = goto_index_of.get(&(p_prime, rule.lhs)) {
                        edges[g_source.0].push(g_target.0);
                    }
                }
            }
        }
    }
    edges
}

fn compute_lookback(
    model: &ItemModel,
    automaton: &Lr0Automaton,
    rule_origins: &HashMap<RuleIndex, Vec<StateIndex>>,
    transitions: &HashMap<(StateIndex, SymbolIndex), StateIndex>,
    goto_index_of: &HashMap<(StateIndex, SymbolIndex), GotoIndex>,
    follow: &Bitset2D,
    token_count: usize,
) -> (HashMap<(StateIndex, RuleIndex), usize>, Bitset2D) {
    let mut reduction_index_of = HashMap::new();
    for (q, state) in automaton.states.iter().enumerate() {
        for &rule in &state.reductions {
            let next = reduction_index_of.len();
            reduction_index_of.entry((StateIndex(q), rule)).or_insert(next);
        }
    }

    let mut lookahead = Bitset2D::new(reduction_index_of.len().max(1), token_count);

    for (r, rule) in model.rules.iter().enumerate() {
        if r < lalr_core::index::FIRST_USER_RULE {
            continue;
        }
        let rule_idx = RuleIndex(r);
        let Some(origins) = rule_origins.get(&rule_idx) else { continue };
        let rhs: Vec<SymbolIndex> = model.items.0[rule.rhs_start.0..rule.rhs_start.0 + rule.rhs_len]
            .iter()
            .map(|s| match s {
                ItemSlot::Symbol(sym) => *sym,
                ItemSlot::EndOfRule(_) => unreachable!(),
            })
            .collect();

        for &p in origins {
            let q = simulate(p, &rhs, transitions);
            let Some(&row) = reduction_index_of.get(&(q, rule_idx)) else { continue };
            if let Some(&g) = goto_index_of.get(&(p, rule.lhs)) {
                for t in follow.iter_row(g.0) {
                    lookahead.set(row, t);
                }
            }
        }
    }

    (reduction_index_of, lookahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{GrammarDescription, Production, SymbolElement};
    use crate::symbol_table::SymbolTable;
    use lalr_core::index::RULE_START;

    // Dragon-book-style grammar with a genuine shift/reduce lookahead split:
    // $end, '+', 'id'; S -> E ; E -> E '+' 'id' | 'id'
    fn sum_grammar() -> (ItemModel, Lr0Automaton, usize) {
        let desc = GrammarDescription::new(
            3,
            vec![
                SymbolElement::terminal("$end"),
                SymbolElement::terminal("+"),
                SymbolElement::terminal("id"),
                SymbolElement::nonterminal("S", vec![Production::new(vec![SymbolIndex(4)])]).start(),
                SymbolElement::nonterminal(
                    "E",
                    vec![
                        Production::new(vec![SymbolIndex(4), SymbolIndex(1), SymbolIndex(2)]),
                        Production::new(vec![SymbolIndex(2)]),
                    ],
                ),
            ],
        );
        let symtab = SymbolTable::build(&desc).unwrap();
        let model = ItemModel::build(&symtab);
        let automaton = crate::lr0::compute_lr0(&model, 3).unwrap();
        (model, automaton, 3)
    }

    #[test]
    fn accept_state_has_a_lookback_entry() {
        let (model, automaton, token_count) = sum_grammar();
        let tables = compute_lalr(&model, &automaton, token_count);
        let accepted = automaton
            .states
            .iter()
            .enumerate()
            .any(|(q, s)| s.reductions.contains(&RULE_START) && tables.reduction_index_of.contains_key(&(StateIndex(q), RULE_START)));
        assert!(accepted);
    }

    #[test]
    fn reduce_by_id_is_followed_by_plus_or_end() {
        let (model, automaton, token_count) = sum_grammar();
        let tables = compute_lalr(&model, &automaton, token_count);
        // Find the state that can reduce E -> id.
        let id_reduce_rule = RuleIndex(lalr_core::index::FIRST_USER_RULE + 2); // S->E(3), E->+id(4), E->id(5)
        let state = automaton
            .states
            .iter()
            .enumerate()
            .find(|(_, s)| s.reductions.contains(&id_reduce_rule))
            .map(|(i, _)| StateIndex(i))
            .expect("some state reduces E -> id");
        let la: Vec<_> = tables.lookahead_set(state, id_reduce_rule).collect();
        assert!(la.contains(&0) || la.contains(&1), "lookahead must contain $end or '+'");
    }
}
