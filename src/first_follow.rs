//! FIRST/FOLLOW set computation (spec.md §4.3).
//!
//! No direct teacher analogue exists as a standalone module — `alap_gen_ng`
//! inlines an equivalent walk into its `GrammarItemSet`/`Specification`
//! closure routine (see `TokenSet::first_all_caps` called from
//! `grammar.rs::closure`) rather than precomputing whole-grammar FIRST/FOLLOW
//! tables. This module follows spec.md's fixed-point formulation directly,
//! in the teacher's `BTreeSet`-based set style.

use crate::production::ProductionSet;
use crate::symbol::{Symbol, SymbolTable};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct FirstEntry {
    pub symbols: BTreeSet<Symbol>,
    pub empty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FollowEntry {
    pub symbols: BTreeSet<Symbol>,
    pub eof: bool,
}

/// A query against a non-terminal with no productions and no prior FIRST
/// entry indicates a grammar-builder bug, not a user error (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownSymbol(pub Symbol);

pub struct FirstSets {
    table: BTreeMap<Symbol, FirstEntry>,
}

impl FirstSets {
    pub fn get(&self, symbol: Symbol) -> Result<&FirstEntry, UnknownSymbol> {
        self.table.get(&symbol).ok_or(UnknownSymbol(symbol))
    }

    /// FIRST of a symbol sequence: walk left to right, unioning FIRST of
    /// each non-terminal (minus empty) until a terminal is hit or a
    /// non-nullable non-terminal stops the walk; the empty marker is
    /// included only if the whole sequence can vanish.
    pub fn of_sequence(&self, sequence: &[Symbol]) -> (BTreeSet<Symbol>, bool) {
        let mut symbols = BTreeSet::new();
        for &symbol in sequence {
            if symbol.is_terminal() {
                symbols.insert(symbol);
                return (symbols, false);
            }
            let entry = self
                .table
                .get(&symbol)
                .expect("first_follow: walked an unregistered non-terminal");
            symbols.extend(entry.symbols.iter().copied());
            if !entry.empty {
                return (symbols, false);
            }
        }
        (symbols, true)
    }
}

/// Fixed-point computation over every production; terminates because the
/// per-non-terminal sets only grow and are bounded by the terminal count
/// (spec.md §4.3, §5).
pub fn compute_first_sets(symbols: &SymbolTable, productions: &ProductionSet) -> FirstSets {
    let mut table: BTreeMap<Symbol, FirstEntry> = symbols
        .non_terminals()
        .map(|s| (s, FirstEntry::default()))
        .collect();

    loop {
        let mut changed = false;
        for production in productions.iter() {
            let lhs = production.lhs();
            let (mut symbols_found, empty) = {
                let first = FirstSets { table: table.clone() };
                first.of_sequence(production.rhs())
            };
            let entry = table.get_mut(&lhs).expect("lhs must be a registered non-terminal");
            let before = entry.symbols.len();
            entry.symbols.append(&mut symbols_found);
            if entry.symbols.len() != before {
                changed = true;
            }
            if empty && !entry.empty {
                entry.empty = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    FirstSets { table }
}

/// Fixed-point FOLLOW computation (spec.md §4.3): start symbol's FOLLOW gets
/// EOF; for every `B -> αAβ`, FIRST(β)\{ε} goes into FOLLOW(A), and if β is
/// nullable, FOLLOW(B) goes into FOLLOW(A) too.
pub fn compute_follow_sets(
    symbols: &SymbolTable,
    productions: &ProductionSet,
    first_sets: &FirstSets,
    start_symbol: Symbol,
) -> BTreeMap<Symbol, FollowEntry> {
    let mut table: BTreeMap<Symbol, FollowEntry> = symbols
        .non_terminals()
        .map(|s| (s, FollowEntry::default()))
        .collect();
    table.entry(start_symbol).or_default().eof = true;

    loop {
        let mut changed = false;
        for production in productions.iter() {
            let rhs = production.rhs();
            for (i, &symbol) in rhs.iter().enumerate() {
                if !symbol.is_non_terminal() {
                    continue;
                }
                let beta = &rhs[i + 1..];
                let (beta_first, beta_empty) = first_sets.of_sequence(beta);
                let entry = table.entry(symbol).or_default();
                let before_len = entry.symbols.len();
                let before_eof = entry.eof;
                entry.symbols.extend(beta_first.iter().copied());
                if beta_empty {
                    let lhs_follow = table
                        .get(&production.lhs())
                        .cloned()
                        .unwrap_or_default();
                    let entry = table.entry(symbol).or_default();
                    entry.symbols.extend(lhs_follow.symbols.iter().copied());
                    entry.eof = entry.eof || lhs_follow.eof;
                }
                let entry = table.entry(symbol).or_default();
                if entry.symbols.len() != before_len || entry.eof != before_eof {
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
    table
}
