//! Flattened rule/item representation and the `FirstDerives` relation that
//! makes LR(0) closure a bitset union instead of a fixpoint over sets of
//! items (§4.2, §4.3).
//!
//! Grounded on the derives/EFF/closure split used by byacc-derived LALR
//! generators (see `examples/other_examples/ca5b8da6_hulunbier-racc__src-lr0.rs.rs`
//! for `set_derives`/`set_nullable`): rather than recomputing which rules a
//! nonterminal can expand to on every closure call, precompute once which
//! *rules* can appear as the very next thing a leftmost derivation from
//! nonterminal `A` produces, across any number of nullable-nonterminal
//! prefixes.

use std::collections::HashMap;

use lalr_core::bitset::Bitset2D;
use lalr_core::index::{ItemIndex, ItemVec, RuleIndex, RuleVec, SymbolIndex, FIRST_USER_RULE, RULE_EMPTY, RULE_INVALID, RULE_START};

use crate::description::Assoc;
use crate::symbol_table::SymbolTable;

/// One flattened slot of the `items` array: either a symbol in a rule's
/// right-hand side, or the rule-ending marker (carrying its own rule number,
/// the way a dotted item needs to know which rule to reduce by once the dot
/// reaches the end).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ItemSlot {
    Symbol(SymbolIndex),
    EndOfRule(RuleIndex),
}

impl ItemSlot {
    pub fn symbol(self) -> Option<SymbolIndex> {
        match self {
            ItemSlot::Symbol(s) => Some(s),
            ItemSlot::EndOfRule(_) => None,
        }
    }

    pub fn is_end(self) -> bool {
        matches!(self, ItemSlot::EndOfRule(_))
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: SymbolIndex,
    pub rhs_start: ItemIndex,
    pub rhs_len: usize,
    pub precedence: u32,
    pub assoc: Assoc,
}

#[derive(Debug, Clone)]
pub struct ItemModel {
    /// Synthetic symbol one past the last declared symbol; LHS of
    /// `RULE_START`. Never surfaced outside this crate.
    pub augmented_start: SymbolIndex,
    pub rules: RuleVec<Rule>,
    pub items: ItemVec<ItemSlot>,
    /// Real non-terminals plus the augmented start symbol.
    pub nonterminal_count: usize,
    /// `derives[local_nt]` lists the rules whose LHS is that non-terminal.
    pub derives: Vec<Vec<RuleIndex>>,
    pub nullable: Vec<bool>,
    /// `nonterminal_count x rules.len()`: row `local_nt` has column `r` set
    /// iff rule `r` can be the first rule invoked by some leftmost
    /// derivation starting from that non-terminal.
    pub first_derives: Bitset2D,
    /// `(precedence, assoc)` per terminal, indexed by `SymbolIndex`. 0
    /// precedence means none was declared.
    pub terminal_precedence: Vec<(u32, Assoc)>,
}

impl ItemModel {
    pub fn build(symtab: &SymbolTable) -> Self {
        let real_nt_count = symtab.nonterminal_count();
        let augmented_start = SymbolIndex(symtab.symbol_count);
        let nonterminal_count = real_nt_count + 1;
        let augmented_local = real_nt_count;

        let precedence_assoc: HashMap<u32, Assoc> = symtab
            .symbols
            .iter()
            .enumerate()
            .filter(|(i, s)| *i < symtab.token_count && s.precedence > 0)
            .map(|(_, s)| (s.precedence, s.assoc))
            .collect();

        let mut items: ItemVec<ItemSlot> = ItemVec::with_capacity(4);
        let mut rules: RuleVec<Rule> = RuleVec::with_capacity(FIRST_USER_RULE);

        // RULE_INVALID (0): unused placeholder slot.
        let invalid_start = items.push(ItemSlot::EndOfRule(RULE_INVALID));
        rules.push(Rule { lhs: augmented_start, rhs_start: invalid_start, rhs_len: 0, precedence: 0, assoc: Assoc::None });

        // RULE_EMPTY (1): the canonical empty production, shared by nothing
        // yet reserved the way byacc reserves rule 1.
        let empty_start = items.push(ItemSlot::EndOfRule(RULE_EMPTY));
        rules.push(Rule { lhs: augmented_start, rhs_start: empty_start, rhs_len: 0, precedence: 0, assoc: Assoc::None });

        // RULE_START (2): S' -> S.
        let start_item = items.push(ItemSlot::Symbol(symtab.start_symbol));
        items.push(ItemSlot::EndOfRule(RULE_START));
        rules.push(Rule { lhs: augmented_start, rhs_start: start_item, rhs_len: 1, precedence: 0, assoc: Assoc::None });

        debug_assert_eq!(rules.len(), FIRST_USER_RULE);

        for (local, prods) in symtab.productions.iter().enumerate() {
            let lhs = SymbolIndex(symtab.token_count + local);
            for prod in prods {
                let rhs_start = if prod.rhs.is_empty() {
                    items.push(ItemSlot::EndOfRule(RuleIndex(rules.len())))
                } else {
                    let start = ItemIndex(items.len());
                    for &s in &prod.rhs {
                        items.push(ItemSlot::Symbol(s));
                    }
                    let rule_number = RuleIndex(rules.len());
                    items.push(ItemSlot::EndOfRule(rule_number));
                    start
                };

                let precedence = match prod.precedence {
                    Some(p) => p,
                    None => prod
                        .rhs
                        .iter()
                        .rev()
                        .find(|&&s| symtab.is_terminal(s))
                        .map(|&s| symtab.symbols[s.0].precedence)
                        .unwrap_or(0),
                };
                let assoc = precedence_assoc.get(&precedence).copied().unwrap_or(Assoc::None);

                rules.push(Rule { lhs, rhs_start, rhs_len: prod.rhs.len(), precedence, assoc });
            }
        }

        let terminal_precedence: Vec<(u32, Assoc)> = symtab.symbols[..symtab.token_count]
            .iter()
            .map(|s| (s.precedence, s.assoc))
            .collect();

        let derives = Self::set_derives(&rules, real_nt_count, augmented_local, symtab.token_count);
        let nullable = Self::set_nullable(&rules, &items, real_nt_count, symtab.token_count);
        let first_derives = Self::set_first_derives(&rules, &items, &derives, nonterminal_count, symtab.token_count);

        ItemModel {
            augmented_start,
            rules,
            items,
            nonterminal_count,
            derives,
            nullable,
            first_derives,
            terminal_precedence,
        }
    }

    fn set_derives(
        rules: &RuleVec<Rule>,
        real_nt_count: usize,
        augmented_local: usize,
        token_count: usize,
    ) -> Vec<Vec<RuleIndex>> {
        let mut derives = vec![Vec::new(); real_nt_count + 1];
        derives[augmented_local].push(RULE_START);
        for (i, rule) in rules.iter().enumerate().skip(FIRST_USER_RULE) {
            let local = rule.lhs.0 - token_count;
            derives[local].push(RuleIndex(i));
        }
        derives
    }

    fn rule_rhs<'a>(rule: &Rule, items: &'a ItemVec<ItemSlot>) -> &'a [ItemSlot] {
        &items.0[rule.rhs_start.0..rule.rhs_start.0 + rule.rhs_len]
    }

    fn set_nullable(
        rules: &RuleVec<Rule>,
        items: &ItemVec<ItemSlot>,
        real_nt_count: usize,
        token_count: usize,
    ) -> Vec<bool> {
        let mut nullable = vec![false; real_nt_count + 1];
        let mut changed = true;
        while changed {
            changed = false;
            for rule in rules.iter().skip(FIRST_USER_RULE) {
                let local = rule.lhs.0 - token_count;
                if nullable[local] {
                    continue;
                }
                let all_nullable = Self::rule_rhs(rule, items).iter().all(|slot| match slot {
                    ItemSlot::Symbol(s) if s.0 >= token_count => nullable[s.0 - token_count],
                    ItemSlot::Symbol(_) => false,
                    ItemSlot::EndOfRule(_) => true,
                });
                if all_nullable {
                    nullable[local] = true;
                    changed = true;
                }
            }
        }
        nullable
    }

    /// Builds the `EFF` relation (§4.3: "if the first right-side symbol is a
    /// non-terminal, set that bit in row L" — the *first* RHS symbol only;
    /// nullable prefixes are handled by the LR(0) closure/goto mechanism
    /// itself, not by widening this relation), closes it, then for each `A`
    /// unions in `derives[B]` for every `B` reachable from `A` (`A` itself
    /// included, via the closure's reflexive bit).
    fn set_first_derives(
        rules: &RuleVec<Rule>,
        items: &ItemVec<ItemSlot>,
        derives: &[Vec<RuleIndex>],
        nonterminal_count: usize,
        token_count: usize,
    ) -> Bitset2D {
        let mut eff = Bitset2D::new(nonterminal_count, nonterminal_count);
        for rule in rules.iter().skip(FIRST_USER_RULE) {
            let from_local = rule.lhs.0 - token_count;
            if let Some(ItemSlot::Symbol(s)) = Self::rule_rhs(rule, items).first() {
                if s.0 >= token_count {
                    eff.set(from_local, s.0 - token_count);
                }
            }
        }
        eff.reflexive_transitive_closure();

        let mut first_derives = Bitset2D::new(nonterminal_count, rules.len());
        for a in 0..nonterminal_count {
            for b in eff.iter_row(a) {
                for &rule in &derives[b] {
                    first_derives.set(a, rule.0);
                }
            }
        }
        first_derives
    }
}
