//! LR(0) canonical collection (spec.md §3, §4.6).
//!
//! Grounded on the teacher's `grammar.rs::closure`/`ParserState` shape
//! (`GrammarItemKey`, kernel-keyed `BTreeMap`, `generate_goto_kernel`) but
//! reworked around this crate's `Production`/`Symbol` types: the teacher
//! keys its item sets by `Rc`-identity and carries per-item lookahead sets
//! from the start, where this module builds the plain LR(0) collection
//! first and leaves lookahead computation to `lookahead::slr`/
//! `lookahead::lalr` (spec.md splits these into separate components).

use crate::production::{Production, ProductionSet};
use crate::symbol::Symbol;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
    pub production: Production,
    pub dot: usize,
}

impl Item {
    pub fn initial(production: Production) -> Self {
        Item { production, dot: 0 }
    }

    pub fn next_symbol(&self) -> Option<Symbol> {
        self.production.rhs().get(self.dot).copied()
    }

    pub fn is_reducible(&self) -> bool {
        self.dot == self.production.len()
    }

    pub fn advance(&self) -> Item {
        Item {
            production: self.production.clone(),
            dot: self.dot + 1,
        }
    }
}

pub type Kernel = BTreeSet<Item>;

#[derive(Debug)]
pub struct State {
    pub id: u32,
    pub kernel: Kernel,
    pub items: BTreeSet<Item>,
    pub reducible: Vec<Production>,
    pub empty_prod_items: Vec<Production>,
    pub shifts: BTreeMap<Symbol, u32>,
    pub gotos: BTreeMap<Symbol, u32>,
    pub is_error_trapper: bool,
}

#[derive(Debug)]
pub struct Automaton {
    pub states: Vec<State>,
    pub initial: u32,
}

/// CLOSURE(I): repeatedly, for every item [A → α・Bβ] in the set, add
/// [B → ・γ] for every production B→γ, until no new items appear (spec.md
/// §4.6).
fn closure(productions: &ProductionSet, kernel: &Kernel) -> BTreeSet<Item> {
    let mut items: BTreeSet<Item> = kernel.clone();
    loop {
        let mut additions = Vec::new();
        for item in &items {
            if let Some(symbol) = item.next_symbol() {
                if symbol.is_non_terminal() {
                    for production in productions.find_by_lhs(symbol) {
                        let candidate = Item::initial(production.clone());
                        if !items.contains(&candidate) {
                            additions.push(candidate);
                        }
                    }
                }
            }
        }
        if additions.is_empty() {
            break;
        }
        items.extend(additions);
    }
    items
}

/// Builds the canonical LR(0) collection starting from the augmented start
/// production (its single item is the initial kernel, spec.md §4.6); unknown
/// kernels are queued and known kernels are identified by kernel-set
/// equality (this crate's substitute for a kernel-id hash, consistent with
/// `lexgen::dfa`'s position-set-equality state identity).
pub fn build(productions: &ProductionSet, error_symbol: Option<Symbol>) -> Automaton {
    let start_production = productions
        .iter()
        .find(|p| p.num() == 1)
        .expect("augmented start production must be numbered 1")
        .clone();
    let initial_kernel: Kernel = std::iter::once(Item::initial(start_production)).collect();

    let mut kernel_ids: BTreeMap<Kernel, u32> = BTreeMap::new();
    let mut queue: VecDeque<Kernel> = VecDeque::new();
    kernel_ids.insert(initial_kernel.clone(), 0);
    queue.push_back(initial_kernel);

    let mut states = Vec::new();
    while let Some(kernel) = queue.pop_front() {
        let id = kernel_ids[&kernel];
        let items = closure(productions, &kernel);

        let mut reducible = Vec::new();
        let mut empty_prod_items = Vec::new();
        for item in &items {
            if item.is_reducible() {
                if item.production.is_empty() {
                    empty_prod_items.push(item.production.clone());
                } else {
                    reducible.push(item.production.clone());
                }
            }
        }

        let mut by_symbol: BTreeMap<Symbol, Kernel> = BTreeMap::new();
        for item in &items {
            if let Some(symbol) = item.next_symbol() {
                by_symbol.entry(symbol).or_default().insert(item.advance());
            }
        }

        let mut shifts = BTreeMap::new();
        let mut gotos = BTreeMap::new();
        let mut is_error_trapper = false;
        for (symbol, target_kernel) in by_symbol {
            if Some(symbol) == error_symbol {
                is_error_trapper = true;
            }
            let next_id = kernel_ids.len() as u32;
            let target_id = *kernel_ids.entry(target_kernel.clone()).or_insert_with(|| {
                queue.push_back(target_kernel.clone());
                next_id
            });
            if symbol.is_terminal() {
                shifts.insert(symbol, target_id);
            } else {
                gotos.insert(symbol, target_id);
            }
        }

        states.push(State {
            id,
            kernel,
            items,
            reducible,
            empty_prod_items,
            shifts,
            gotos,
            is_error_trapper,
        });
    }
    states.sort_by_key(|s| s.id);

    Automaton { states, initial: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    fn arithmetic_automaton() -> (SymbolTable, ProductionSet, Automaton) {
        let mut symbols = SymbolTable::new();
        let s = symbols.register_start("S'").unwrap();
        let expr = symbols.register_non_terminal("expr").unwrap();
        let term = symbols.register_non_terminal("term").unwrap();
        let factor = symbols.register_non_terminal("factor").unwrap();
        let plus = symbols.register_terminal("+").unwrap();
        let star = symbols.register_terminal("*").unwrap();
        let lparen = symbols.register_terminal("(").unwrap();
        let rparen = symbols.register_terminal(")").unwrap();
        let id = symbols.register_terminal("id").unwrap();

        let mut productions = ProductionSet::new();
        productions.set_start_symbol(s);
        productions.append(s, vec![expr]);
        productions.append(expr, vec![expr, plus, term]);
        productions.append(expr, vec![term]);
        productions.append(term, vec![term, star, factor]);
        productions.append(term, vec![factor]);
        productions.append(factor, vec![lparen, expr, rparen]);
        productions.append(factor, vec![id]);

        let automaton = build(&productions, None);
        (symbols, productions, automaton)
    }

    #[test]
    fn initial_state_closure_includes_every_factor_alternative() {
        let (_, _, automaton) = arithmetic_automaton();
        let initial = &automaton.states[automaton.initial as usize];
        assert_eq!(initial.kernel.len(), 1);
        let factor_item_count = initial
            .items
            .iter()
            .filter(|item| item.dot == 0 && item.production.len() > 0)
            .count();
        assert!(factor_item_count >= 6);
    }

    #[test]
    fn goto_on_id_reaches_a_reducible_state() {
        let (symbols, _, automaton) = arithmetic_automaton();
        let id = symbols.to_symbol("id").unwrap();
        let initial = &automaton.states[automaton.initial as usize];
        let target = *initial.shifts.get(&id).expect("shift on id from initial state");
        let state = &automaton.states[target as usize];
        assert_eq!(state.reducible.len(), 1);
        assert_eq!(state.reducible[0].rhs(), &[id]);
    }

    #[test]
    fn error_symbol_marks_its_states_as_trappers() {
        let mut symbols = SymbolTable::new();
        let s = symbols.register_start("S'").unwrap();
        let x = symbols.register_non_terminal("X").unwrap();
        let error = symbols.register_terminal("error").unwrap();
        let a = symbols.register_terminal("a").unwrap();
        let mut productions = ProductionSet::new();
        productions.set_start_symbol(s);
        productions.append(s, vec![x]);
        productions.append(x, vec![error]);
        productions.append(x, vec![a]);
        let automaton = build(&productions, Some(error));
        let initial = &automaton.states[automaton.initial as usize];
        assert!(initial.is_error_trapper);
    }
}
