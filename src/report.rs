//! Language-neutral description record (spec.md §4.11): a sorted, plain-data
//! enumeration of terminals, non-terminals, productions and states, meant to
//! be rendered or diffed by a collaborator without depending on any crate
//! type.
//!
//! Grounded on the teacher's `Grammar::write_description`/
//! `describe_sr_conflict_states`/`describe_rr_conflict_states` in
//! `grammar.rs`, which walks the same state/item/conflict data to emit a
//! human-readable `.stable` file; here the destination is a data record
//! instead of text, and conflict codes follow spec.md §6's numbering
//! instead of the teacher's own enum.

use crate::automaton::{Automaton, Item};
use crate::lookahead::Lookaheads;
use crate::precedence::PrecedenceMap;
use crate::production::ProductionSet;
use crate::symbol::SymbolTable;
use crate::table::{Conflict, ConflictKind, Resolution, Table};

#[derive(Debug, Clone)]
pub struct TerminalEntry {
    pub name: String,
    pub precedence: u16,
    pub associativity: String,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone)]
pub struct NonTerminalEntry {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ProductionEntry {
    pub num: u16,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ReduceEntry {
    pub production: u16,
    pub lookahead: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConflictEntry {
    pub terminal: String,
    pub kind: &'static str,
    pub resolution_code: u8,
    pub productions: Vec<u16>,
}

#[derive(Debug, Clone)]
pub struct StateEntry {
    pub id: u32,
    pub kernel_items: Vec<String>,
    pub shifts: Vec<(String, u32)>,
    pub gotos: Vec<(String, u32)>,
    pub reduces: Vec<ReduceEntry>,
    pub conflicts: Vec<ConflictEntry>,
}

#[derive(Debug, Clone)]
pub struct Description {
    pub terminals: Vec<TerminalEntry>,
    pub non_terminals: Vec<NonTerminalEntry>,
    pub productions: Vec<ProductionEntry>,
    pub states: Vec<StateEntry>,
}

fn resolution_code(resolution: Resolution) -> u8 {
    resolution as u8
}

fn conflict_kind_label(kind: ConflictKind) -> &'static str {
    match kind {
        ConflictKind::ShiftReduce => "shift/reduce",
        ConflictKind::ReduceReduce => "reduce/reduce",
    }
}

pub fn describe(
    symbols: &SymbolTable,
    productions: &ProductionSet,
    precedence: &PrecedenceMap,
    automaton: &Automaton,
    table: &Table,
    lookaheads: &Lookaheads,
) -> Description {
    let terminals = symbols
        .terminals()
        .map(|symbol| {
            let info = precedence.terminal_prec(symbol);
            TerminalEntry {
                name: symbols.to_text(symbol).unwrap_or("?").to_string(),
                precedence: info.precedence,
                associativity: info.associativity.to_string(),
                is_anonymous: symbols.to_text(symbol).map(|t| t.starts_with("__") && t.ends_with("__")).unwrap_or(false),
            }
        })
        .collect();

    let non_terminals = symbols
        .non_terminals()
        .map(|symbol| NonTerminalEntry { name: symbols.to_text(symbol).unwrap_or("?").to_string() })
        .collect();

    let production_entries = productions.iter().map(|p| ProductionEntry { num: p.num(), text: p.to_string() }).collect();

    let mut conflicts_by_state: Vec<Vec<&Conflict>> = vec![Vec::new(); automaton.states.len()];
    for conflict in &table.conflicts {
        conflicts_by_state[conflict.state as usize].push(conflict);
    }

    let states = automaton
        .states
        .iter()
        .map(|state| {
            let mut kernel_items: Vec<String> = state
                .kernel
                .iter()
                .map(|item| format!("{} . (dot {})", item.production, item.dot))
                .collect();
            kernel_items.sort();

            let mut shifts: Vec<(String, u32)> =
                state.shifts.iter().map(|(&symbol, &target)| (symbols.to_text(symbol).unwrap_or("?").to_string(), target)).collect();
            shifts.sort_by_key(|(_, target)| *target);

            let mut gotos: Vec<(String, u32)> =
                state.gotos.iter().map(|(&symbol, &target)| (symbols.to_text(symbol).unwrap_or("?").to_string(), target)).collect();
            gotos.sort_by_key(|(_, target)| *target);

            let mut reduces: Vec<ReduceEntry> = state
                .reducible
                .iter()
                .map(|production| {
                    let item = Item { production: production.clone(), dot: production.len() };
                    let mut lookahead: Vec<String> = lookaheads
                        .get(state.id, &item)
                        .map(|set| set.iter().map(|&s| symbols.to_text(s).unwrap_or("?").to_string()).collect())
                        .unwrap_or_default();
                    lookahead.sort();
                    ReduceEntry { production: production.num(), lookahead }
                })
                .collect();
            reduces.sort_by_key(|r| r.production);

            let mut conflicts: Vec<ConflictEntry> = conflicts_by_state[state.id as usize]
                .iter()
                .map(|c| ConflictEntry {
                    terminal: symbols.to_text(c.terminal).unwrap_or("?").to_string(),
                    kind: conflict_kind_label(c.kind),
                    resolution_code: resolution_code(c.resolution),
                    productions: c.productions.clone(),
                })
                .collect();
            conflicts.sort_by(|a, b| a.terminal.cmp(&b.terminal));

            StateEntry { id: state.id, kernel_items, shifts, gotos, reduces, conflicts }
        })
        .collect();

    Description { terminals, non_terminals, productions: production_entries, states }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Alternative, Element, GrammarAst, NonTerminalDecl};
    use crate::grammar::compile::{compile_parser, LookaheadStrategy};

    #[test]
    fn description_lists_every_production_and_state() {
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
        let (grammar, diagnostics) = crate::grammar::build(&ast);
        assert!(!diagnostics.has_errors());
        let compiled = compile_parser(&grammar, LookaheadStrategy::Lalr);
        let description = describe(
            &grammar.symbols,
            &grammar.productions,
            &grammar.precedence,
            &compiled.automaton,
            &compiled.table,
            &compiled.lookaheads,
        );
        assert_eq!(description.productions.len(), 2);
        assert_eq!(description.states.len(), compiled.automaton.states.len());
        assert_eq!(description.terminals.len(), 2);
        assert!(description.terminals.iter().any(|t| t.is_anonymous));
    }
}
