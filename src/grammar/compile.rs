//! Wires the LR(0) automaton, look-ahead computation and table builder into
//! one call, then reshapes `Table` into spec.md §6's "Compiled parsing
//! table" field list (named arrays instead of this crate's dense-index
//! structs, so an external driver has no crate types to depend on).
//!
//! Grounded on the teacher's `Grammar::new_production`/state-building path
//! in `grammar.rs`, which ends in the same kind of flat description the
//! teacher's code generator emits; here the destination is a data record
//! instead of generated Rust source.

use super::CompiledGrammar;
use crate::automaton::{self, Automaton};
use crate::first_follow::{compute_first_sets, compute_follow_sets};
use crate::lookahead::{lalr, slr, Lookaheads};
use crate::table::{self, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookaheadStrategy {
    Slr,
    Lalr,
}

/// spec.md §6's "Compiled parsing table", with every field drawn only from
/// plain numbers and names: no `Symbol`/`Production` handles leak out.
#[derive(Debug)]
pub struct ParsingTable {
    pub action: Vec<i32>,
    pub go_to: Vec<u32>,
    pub state_count: usize,
    pub initial_state: u32,
    pub start_production: u16,
    pub lhs_symbols: Vec<u16>,
    pub alternative_symbol_counts: Vec<u16>,
    pub terminals: Vec<String>,
    pub non_terminals: Vec<String>,
    pub eof_symbol: u16,
    pub expected_terminals: Vec<Vec<String>>,
    pub error_trapper_states: Vec<bool>,
}

#[derive(Debug)]
pub struct CompiledParser {
    pub automaton: Automaton,
    pub lookaheads: Lookaheads,
    pub table: Table,
    pub parsing_table: ParsingTable,
}

pub fn compile_parser(grammar: &CompiledGrammar, strategy: LookaheadStrategy) -> CompiledParser {
    let automaton = automaton::build(&grammar.productions, grammar.error_symbol);
    let first = compute_first_sets(&grammar.symbols, &grammar.productions);
    let lookaheads = match strategy {
        LookaheadStrategy::Lalr => lalr::compute(&automaton, &grammar.productions, &first, &grammar.symbols),
        LookaheadStrategy::Slr => {
            let follow = compute_follow_sets(&grammar.symbols, &grammar.productions, &first, grammar.start_symbol);
            slr::compute(&automaton, &follow, &grammar.symbols)
        }
    };
    let table = table::build(&automaton, &grammar.productions, &grammar.symbols, &grammar.precedence, &lookaheads);

    let start_production = grammar
        .productions
        .find_by_lhs(grammar.start_symbol)
        .first()
        .expect("augmented start always has exactly one alternative")
        .num();

    let mut lhs_symbols = vec![0u16; grammar.productions.len()];
    let mut alternative_symbol_counts = vec![0u16; grammar.productions.len()];
    for production in grammar.productions.iter() {
        let index = production.num() as usize - 1;
        lhs_symbols[index] = production.lhs().number();
        alternative_symbol_counts[index] = production.len() as u16;
    }

    let terminals: Vec<String> = grammar.symbols.terminals().map(|s| grammar.symbols.to_text(s).unwrap_or("?").to_string()).collect();
    let non_terminals: Vec<String> = grammar.symbols.non_terminals().map(|s| grammar.symbols.to_text(s).unwrap_or("?").to_string()).collect();
    let expected_terminals: Vec<Vec<String>> = table
        .expected_terminals
        .iter()
        .map(|row| row.iter().map(|&s| grammar.symbols.to_text(s).unwrap_or("?").to_string()).collect())
        .collect();

    let parsing_table = ParsingTable {
        action: table.action.clone(),
        go_to: table.goto.clone(),
        state_count: table.state_count,
        initial_state: automaton.initial,
        start_production,
        lhs_symbols,
        alternative_symbol_counts,
        terminals,
        non_terminals,
        eof_symbol: grammar.symbols.eof().number(),
        expected_terminals,
        error_trapper_states: table.error_trapper_states.clone(),
    };

    CompiledParser { automaton, lookaheads, table, parsing_table }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Alternative, Element, GrammarAst, NonTerminalDecl};

    #[test]
    fn scenario_1_shift_a_then_reduce_on_eof() {
        let ast = GrammarAst {
            name: Some("g".into()),
            start: "s".into(),
            precedence: Vec::new(),
            terminals: Vec::new(),
            fragments: Vec::new(),
            non_terminals: vec![NonTerminalDecl {
                name: "s".into(),
                row: 1,
                alternatives: vec![Alternative {
                    elements: vec![Element::Pattern("a".into())],
                    prec_override: None,
                    ast_directives: Vec::new(),
                    row: 1,
                }],
            }],
        };
        let (grammar, diagnostics) = super::super::build(&ast);
        assert!(!diagnostics.has_errors());
        let compiled = compile_parser(&grammar, LookaheadStrategy::Lalr);
        assert_eq!(compiled.parsing_table.terminals, vec!["EOF".to_string(), "__1__".to_string()]);
        assert_eq!(compiled.parsing_table.state_count, compiled.automaton.states.len());
        assert!(compiled.table.conflicts.is_empty());
    }
}
