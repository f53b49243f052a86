//! Precedence and associativity (spec.md §3, §4.10 step 7-8).
//!
//! `Associativity` is lifted directly from the teacher's `symbol.rs`. The
//! teacher stores precedence/associativity as `Cell`s on the shared
//! `Token`/`Tag` handles; here, since symbols are plain `Copy` codes, the
//! data lives in a side table (`PrecedenceMap`) instead — the spec's "0 is
//! the unspecified sentinel" design note (spec.md §9) applies throughout.

use crate::production::Production;
use crate::symbol::Symbol;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    NonAssoc,
    Left,
    Right,
}

impl Default for Associativity {
    fn default() -> Self {
        Associativity::NonAssoc
    }
}

impl std::fmt::Display for Associativity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Associativity::NonAssoc => write!(f, "NonAssoc"),
            Associativity::Left => write!(f, "Left"),
            Associativity::Right => write!(f, "Right"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrecInfo {
    pub precedence: u16,
    pub associativity: Associativity,
}

impl PrecInfo {
    pub fn is_specified(&self) -> bool {
        self.precedence != 0
    }
}

/// Per-terminal precedence/associativity, plus the per-production values
/// derived from (or overriding) them (spec.md §4.10 step 8).
#[derive(Debug, Default)]
pub struct PrecedenceMap {
    terminals: BTreeMap<Symbol, PrecInfo>,
    productions: BTreeMap<u16, PrecInfo>,
    next_precedence: u16,
}

impl PrecedenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares one `%left`/`%right`/`%nonassoc` line; the whole list shares
    /// one precedence level, one level higher than the previous declaration
    /// (spec.md §4.10 step 7: "assign increasing precedence levels...in
    /// declaration order").
    pub fn declare(&mut self, associativity: Associativity, symbols: &[Symbol]) {
        self.next_precedence += 1;
        let precedence = self.next_precedence;
        for &symbol in symbols {
            self.terminals.insert(
                symbol,
                PrecInfo {
                    precedence,
                    associativity,
                },
            );
        }
    }

    pub fn terminal_prec(&self, symbol: Symbol) -> PrecInfo {
        self.terminals.get(&symbol).copied().unwrap_or_default()
    }

    pub fn set_terminal_prec(&mut self, symbol: Symbol, info: PrecInfo) {
        self.terminals.insert(symbol, info);
    }

    /// Rightmost-terminal-donates rule, with `#prec` override support: pass
    /// `explicit` when the production carries a `#prec` directive.
    pub fn derive_production_prec(&mut self, production: &Production, explicit: Option<Symbol>) {
        let info = if let Some(symbol) = explicit {
            self.terminal_prec(symbol)
        } else {
            production
                .rhs()
                .iter()
                .rev()
                .find(|s| s.is_terminal())
                .map(|&s| self.terminal_prec(s))
                .unwrap_or_default()
        };
        self.productions.insert(production.num(), info);
    }

    pub fn production_prec(&self, production: &Production) -> PrecInfo {
        self.productions
            .get(&production.num())
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::ProductionSet;
    use crate::symbol::SymbolTable;

    #[test]
    fn later_declarations_get_higher_precedence() {
        let mut table = SymbolTable::new();
        let plus = table.register_terminal("+").unwrap();
        let star = table.register_terminal("*").unwrap();
        let mut prec = PrecedenceMap::new();
        prec.declare(Associativity::Left, &[plus]);
        prec.declare(Associativity::Left, &[star]);
        assert!(prec.terminal_prec(star).precedence > prec.terminal_prec(plus).precedence);
    }

    #[test]
    fn production_inherits_rightmost_terminal_precedence() {
        let mut table = SymbolTable::new();
        let e = table.register_non_terminal("E").unwrap();
        let plus = table.register_terminal("+").unwrap();
        let mut prec = PrecedenceMap::new();
        prec.declare(Associativity::Left, &[plus]);
        let mut set = ProductionSet::new();
        set.set_start_symbol(e);
        set.append(e, vec![e, plus, e]);
        let production = set.find_by_lhs(e)[0].clone();
        prec.derive_production_prec(&production, None);
        assert_eq!(prec.production_prec(&production).associativity, Associativity::Left);
    }
}
