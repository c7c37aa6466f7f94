//! Top-level entry point (§2, §4.8, §6): `generate()` runs the full
//! pipeline — validate, build items, build the LR(0) automaton, compute
//! LALR lookaheads, resolve conflicts, pack tables — and assembles the
//! result into the flat `GeneratedTables` shape callers consume.
//!
//! Stage transitions are logged at `info`, per-state/per-rule detail at
//! `debug`/`trace`, the way a long-running build step in the teacher's own
//! generator reports progress (`rustemo-tools/src/generator/mod.rs` logs
//! each codegen phase it enters).

use lalr_core::error::Result;
use lalr_core::index::{FIRST_USER_RULE, RULE_START};

use crate::description::{GeneratedTables, GrammarDescription};
use crate::item_model::ItemModel;
use crate::lalr;
use crate::lr0;
use crate::parser_builder;
use crate::symbol_table::SymbolTable;
use crate::table_packer;

/// Runs the full LALR(1) table generation pipeline over `desc` (§6).
///
/// Returns [`GenError::InvalidSpecification`](lalr_core::error::GenError)
/// if `desc` fails validation (§4.2); otherwise always succeeds, even for
/// grammars riddled with conflicts — conflicts are reported in the
/// returned tables, not treated as errors, matching yacc's own behavior of
/// emitting a (possibly unusable) parser alongside its conflict counts.
pub fn generate(desc: &GrammarDescription) -> Result<GeneratedTables> {
    log::info!("validating grammar: {} symbols, {} tokens", desc.symbol_count, desc.token_count);
    let symtab = SymbolTable::build(desc)?;

    log::info!("building item model: {} non-terminals", symtab.nonterminal_count());
    let model = ItemModel::build(&symtab);
    log::debug!("flattened {} rules into {} item slots", model.rules.len(), model.items.len());

    log::info!("constructing LR(0) automaton");
    let automaton = lr0::compute_lr0(&model, symtab.token_count)?;
    log::info!("LR(0) automaton has {} states", automaton.states.len());

    log::info!("computing LALR(1) lookahead sets");
    let lalr_tables = lalr::compute_lalr(&model, &automaton, symtab.token_count);

    log::info!("resolving conflicts and building action tables");
    let parser_tables = parser_builder::build_parser_tables(&model, &automaton, &lalr_tables);
    log::info!(
        "{} shift/reduce conflicts, {} reduce/reduce conflicts",
        parser_tables.shift_reduce_conflicts,
        parser_tables.reduce_reduce_conflicts
    );

    log::info!("packing displacement tables");
    let packed = table_packer::pack_tables(&automaton, &parser_tables, model.nonterminal_count - 1, symtab.token_count);
    log::debug!("packed table occupies {} entries", packed.table.len());

    let final_state = automaton
        .states
        .iter()
        .position(|s| s.reductions.contains(&RULE_START))
        .map(lalr_core::index::StateIndex)
        .unwrap_or_default();

    let unused_rules = find_unused_rules(&model, &automaton);
    for rule in &unused_rules {
        log::warn!("rule {} is never reduced (unreachable from the start symbol)", rule.0);
    }

    let shift_reduce_conflicts =
        parser_tables.shift_reduce_conflicts as isize - desc.expected_shift_reduce_conflicts as isize;
    let reduce_reduce_conflicts =
        parser_tables.reduce_reduce_conflicts as isize - desc.expected_reduce_reduce_conflicts as isize;
    if shift_reduce_conflicts != 0 || reduce_reduce_conflicts != 0 {
        log::warn!(
            "conflict counts differ from expectations by ({}, {})",
            shift_reduce_conflicts,
            reduce_reduce_conflicts
        );
    }

    let (left_side, rule_length) = describe_rules(&model);
    let names: Vec<Vec<u8>> = symtab.symbols.iter().map(|s| s.name.clone()).collect();
    let rules = describe_productions(&symtab, &model);
    let table_size = packed.table.len();

    Ok(GeneratedTables {
        left_side,
        rule_length,
        default_reductions: packed.default_reductions,
        shift_index: packed.shift_index,
        reduce_index: packed.reduce_index,
        goto_index: packed.goto_index,
        default_goto: packed.default_goto,
        table: packed.table,
        check: packed.check,
        names,
        rules,
        final_state,
        start_rule: RULE_START,
        last_token: desc.token_count - 1,
        undefined_token: desc.token_count,
        table_size,
        shift_reduce_conflicts,
        reduce_reduce_conflicts,
        unused_rules,
    })
}

fn describe_rules(model: &ItemModel) -> (Vec<lalr_core::index::SymbolIndex>, Vec<usize>) {
    let mut left_side = Vec::with_capacity(model.rules.len() - FIRST_USER_RULE);
    let mut rule_length = Vec::with_capacity(model.rules.len() - FIRST_USER_RULE);
    for rule in model.rules.iter().skip(FIRST_USER_RULE) {
        left_side.push(rule.lhs);
        rule_length.push(rule.rhs_len);
    }
    (left_side, rule_length)
}

fn describe_productions(symtab: &SymbolTable, model: &ItemModel) -> Vec<String> {
    model
        .rules
        .iter()
        .skip(FIRST_USER_RULE)
        .map(|rule| {
            let rhs: Vec<String> = model.items.0[rule.rhs_start.0..rule.rhs_start.0 + rule.rhs_len]
                .iter()
                .map(|slot| match slot {
                    crate::item_model::ItemSlot::Symbol(sym) => String::from_utf8_lossy(symtab.name(*sym)).into_owned(),
                    crate::item_model::ItemSlot::EndOfRule(_) => unreachable!(),
                })
                .collect();
            format!("{} : {}", String::from_utf8_lossy(symtab.name(rule.lhs)), rhs.join(" "))
        })
        .collect()
}

fn find_unused_rules(model: &ItemModel, automaton: &lr0::Lr0Automaton) -> Vec<lalr_core::index::RuleIndex> {
    let mut reduced: std::collections::HashSet<_> = std::collections::HashSet::new();
    for state in automaton.states.iter() {
        for &rule in &state.reductions {
            reduced.insert(rule);
        }
    }
    (FIRST_USER_RULE..model.rules.len())
        .map(lalr_core::index::RuleIndex)
        .filter(|r| !reduced.contains(r))
        .collect()
}
