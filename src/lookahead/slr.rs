//! SLR(1) look-aheads (spec.md §4.7): every reducible item's look-ahead is
//! just FOLLOW of its production's LHS, overlaid directly onto the LR(0)
//! automaton. New code — the teacher only ever builds LALR(1) tables — but
//! a direct, near-trivial reading of spec.md §4.7.

use super::Lookaheads;
use crate::automaton::Automaton;
use crate::first_follow::FollowEntry;
use crate::symbol::{Symbol, SymbolTable};
use std::collections::BTreeMap;

pub fn compute(automaton: &Automaton, follow_sets: &BTreeMap<Symbol, FollowEntry>, symbols: &SymbolTable) -> Lookaheads {
    let eof = symbols.eof();
    let mut table = Lookaheads::default();
    for state in &automaton.states {
        for item in state.items.iter().filter(|item| item.is_reducible()) {
            let follow = follow_sets.get(&item.production.lhs()).cloned().unwrap_or_default();
            let entry = table.0.entry((state.id, item.clone())).or_default();
            entry.extend(follow.symbols.iter().copied());
            if follow.eof {
                entry.insert(eof);
            }
        }
    }
    table
}
