//! LALR(1) look-aheads via DeRemer-Pennello spontaneous generation and
//! propagation (spec.md §4.8).
//!
//! The teacher's own `state.rs`/`grammar.rs` (`merge_lookahead_sets`,
//! `closure` carrying live `TokenSet` lookaheads from the start) takes a
//! simpler "recompute lookaheads directly during closure, merge into
//! already-processed states, reprocess if they grew" approach rather than a
//! two-phase propagation graph. spec.md §4.8 explicitly calls for the
//! classic DeRemer-Pennello construction instead, so this module is new
//! code grounded on spec.md's description (and, for the general closure-
//! with-a-placeholder-lookahead shape, `mirryi-isc/lalr/src/lalr.rs`).

use crate::automaton::{Automaton, Item};
use crate::first_follow::FirstSets;
use crate::production::ProductionSet;
use crate::symbol::{Symbol, SymbolTable};
use std::collections::{BTreeMap, BTreeSet};

use super::Lookaheads;

type Node = (u32, Item);

/// `None` is the DeRemer-Pennello dummy symbol `#`: it stands for "whatever
/// ends up in the originating kernel item's look-ahead", discovered once per
/// kernel item instead of once per terminal, so spontaneous generation and
/// propagation edges are found in a single closure pass.
type LookaheadOrDummy = Option<Symbol>;

fn first_of_tail(beta: &[Symbol], tail: LookaheadOrDummy, first_sets: &FirstSets) -> (BTreeSet<Symbol>, bool) {
    match tail {
        None => first_sets.of_sequence(beta),
        Some(symbol) => {
            let mut sequence: Vec<Symbol> = beta.to_vec();
            sequence.push(symbol);
            let (firsts, _) = first_sets.of_sequence(&sequence);
            (firsts, false)
        }
    }
}

/// Closes a single kernel item `k` with the dummy symbol as its seed
/// look-ahead, returning every item reachable from it together with the set
/// of real terminals / dummy markers attached to each (spec.md §4.8
/// "compute its LALR(1) closure").
fn close_with_dummy(
    k: &Item,
    productions: &ProductionSet,
    first_sets: &FirstSets,
) -> BTreeMap<Item, BTreeSet<LookaheadOrDummy>> {
    let mut j: BTreeMap<Item, BTreeSet<LookaheadOrDummy>> = BTreeMap::new();
    j.entry(k.clone()).or_default().insert(None);

    loop {
        let mut additions: Vec<(Item, LookaheadOrDummy)> = Vec::new();
        for (item, lookaheads) in &j {
            let symbol = match item.next_symbol() {
                Some(s) if s.is_non_terminal() => s,
                _ => continue,
            };
            let beta = &item.production.rhs()[item.dot + 1..];
            for &la in lookaheads {
                let (firsts, dummy_passes_through) = first_of_tail(beta, la, first_sets);
                for production in productions.find_by_lhs(symbol) {
                    let new_item = Item::initial(production.clone());
                    for &f in &firsts {
                        additions.push((new_item.clone(), Some(f)));
                    }
                    if la.is_none() && dummy_passes_through {
                        additions.push((new_item.clone(), None));
                    }
                }
            }
        }
        let mut changed = false;
        for (item, la) in additions {
            if j.entry(item).or_default().insert(la) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    j
}

/// Phase 1 (spec.md §4.8): for every kernel item in every state, discover
/// spontaneous look-ahead terminals and propagation edges.
fn discover(
    automaton: &Automaton,
    productions: &ProductionSet,
    first_sets: &FirstSets,
) -> (BTreeMap<Node, BTreeSet<Symbol>>, Vec<(Node, Node)>) {
    let mut spontaneous: BTreeMap<Node, BTreeSet<Symbol>> = BTreeMap::new();
    let mut edges: Vec<(Node, Node)> = Vec::new();

    for state in &automaton.states {
        for k in &state.kernel {
            let closed = close_with_dummy(k, productions, first_sets);
            for (item, lookaheads) in &closed {
                let destination = match item.next_symbol() {
                    None => (state.id, item.clone()),
                    Some(symbol) => {
                        let target = state
                            .shifts
                            .get(&symbol)
                            .or_else(|| state.gotos.get(&symbol))
                            .copied()
                            .expect("every dotted symbol in a closure has an outgoing edge");
                        (target, item.advance())
                    }
                };
                for &la in lookaheads {
                    match la {
                        Some(symbol) => {
                            spontaneous.entry(destination.clone()).or_default().insert(symbol);
                        }
                        None => edges.push(((state.id, k.clone()), destination.clone())),
                    }
                }
            }
        }
    }
    (spontaneous, edges)
}

/// Computes LALR(1) look-aheads: discover spontaneous generation and
/// propagation edges (spec.md §4.8 phase 1), seed the start item with EOF,
/// then iterate the propagation edges to a fixed point (phase 2).
pub fn compute(
    automaton: &Automaton,
    productions: &ProductionSet,
    first_sets: &FirstSets,
    symbols: &SymbolTable,
) -> Lookaheads {
    let (spontaneous, edges) = discover(automaton, productions, first_sets);
    let mut lookahead = spontaneous;

    let start_item = automaton.states[automaton.initial as usize]
        .kernel
        .iter()
        .next()
        .expect("initial state has exactly one kernel item")
        .clone();
    lookahead
        .entry((automaton.initial, start_item))
        .or_default()
        .insert(symbols.eof());

    loop {
        let mut changed = false;
        for (src, dst) in &edges {
            let addition = lookahead.get(src).cloned().unwrap_or_default();
            let entry = lookahead.entry(dst.clone()).or_default();
            let before = entry.len();
            entry.extend(addition);
            if entry.len() != before {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    Lookaheads(lookahead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton;
    use crate::first_follow::compute_first_sets;

    fn arithmetic() -> (SymbolTable, ProductionSet, Symbol, Symbol, Symbol) {
        let mut symbols = SymbolTable::new();
        let s = symbols.register_start("S'").unwrap();
        let expr = symbols.register_non_terminal("expr").unwrap();
        let plus = symbols.register_terminal("+").unwrap();
        let id = symbols.register_terminal("id").unwrap();

        let mut productions = ProductionSet::new();
        productions.set_start_symbol(s);
        productions.append(s, vec![expr]);
        productions.append(expr, vec![expr, plus, id]);
        productions.append(expr, vec![id]);
        (symbols, productions, s, plus, id)
    }

    #[test]
    fn start_item_lookahead_is_eof() {
        let (symbols, productions, _, _, _) = arithmetic();
        let first = compute_first_sets(&symbols, &productions);
        let automaton = automaton::build(&productions, None);
        let lookaheads = compute(&automaton, &productions, &first, &symbols);
        let initial = &automaton.states[automaton.initial as usize];
        let start_item = initial.kernel.iter().next().unwrap();
        let la = lookaheads.get(initial.id, start_item).unwrap();
        let expected: BTreeSet<Symbol> = std::iter::once(symbols.eof()).collect();
        assert_eq!(la, &expected);
    }

    #[test]
    fn reduce_by_id_sees_plus_and_eof() {
        let (symbols, productions, _, plus, id) = arithmetic();
        let first = compute_first_sets(&symbols, &productions);
        let automaton = automaton::build(&productions, None);
        let lookaheads = compute(&automaton, &productions, &first, &symbols);

        let initial = &automaton.states[automaton.initial as usize];
        let target = *initial.shifts.get(&id).unwrap();
        let state = &automaton.states[target as usize];
        let item = state.kernel.iter().next().unwrap();
        let la = lookaheads.get(state.id, item).unwrap();
        assert!(la.contains(&plus));
        assert!(la.contains(&symbols.eof()));
    }

    #[test]
    fn lalr_resolves_canonical_lr0_ambiguous_grammar() {
        // S: L '=' R | R ; L: '*' R | id ; R: L ;  — SLR fails here because
        // FOLLOW(R) includes '=', but LALR keeps the two uses of R separate
        // so the L='*' R kernel item's look-ahead never includes '='.
        let mut symbols = SymbolTable::new();
        let s = symbols.register_start("S'").unwrap();
        let l = symbols.register_non_terminal("L").unwrap();
        let r = symbols.register_non_terminal("R").unwrap();
        let eq = symbols.register_terminal("=").unwrap();
        let star = symbols.register_terminal("*").unwrap();
        let id = symbols.register_terminal("id").unwrap();

        let mut productions = ProductionSet::new();
        productions.set_start_symbol(s);
        productions.append(s, vec![l, eq, r]);
        productions.append(s, vec![r]);
        productions.append(l, vec![star, r]);
        productions.append(l, vec![id]);
        productions.append(r, vec![l]);

        let first = compute_first_sets(&symbols, &productions);
        let automaton = automaton::build(&productions, None);
        let lookaheads = compute(&automaton, &productions, &first, &symbols);

        // No state should have an item set with a shift/reduce or
        // reduce/reduce conflict under the LALR look-aheads: every state's
        // reducible-item look-ahead sets must be pairwise disjoint from each
        // other and from any shiftable terminal in that state.
        for state in &automaton.states {
            let mut seen: BTreeSet<Symbol> = BTreeSet::new();
            for item in state.items.iter().filter(|i| i.is_reducible()) {
                if let Some(la) = lookaheads.get(state.id, item) {
                    for &t in la {
                        assert!(
                            !state.shifts.contains_key(&t),
                            "state {} has a shift/reduce conflict on {:?}",
                            state.id,
                            t
                        );
                        assert!(seen.insert(t), "state {} has a reduce/reduce conflict on {:?}", state.id, t);
                    }
                }
            }
        }
    }
}
