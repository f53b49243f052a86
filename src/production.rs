//! Productions and the production set (spec.md §3, §4.2).
//!
//! Mirrors the teacher's `production.rs` shape (`ProductionData` wrapped in
//! an `Rc`-like cheap-clone handle, `Display` rendering `LHS: a b c`) but
//! swaps the teacher's `Rc`-identity production numbering for the content
//! hash spec.md mandates, so that two productions with the same LHS/RHS
//! collapse to one entry regardless of where they were declared.

use crate::symbol::Symbol;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type ProductionId = [u8; 32];

fn hash_production(lhs: Symbol, rhs: &[Symbol]) -> ProductionId {
    let mut hasher = Sha256::new();
    hasher.update(lhs.number().to_be_bytes());
    hasher.update([lhs.is_terminal() as u8]);
    for symbol in rhs {
        hasher.update(symbol.number().to_be_bytes());
        hasher.update([symbol.is_terminal() as u8]);
    }
    hasher.finalize().into()
}

#[derive(Debug)]
struct ProductionData {
    id: ProductionId,
    num: u16,
    lhs: Symbol,
    rhs: Vec<Symbol>,
}

/// A single grammar rule. Cheap to clone (shares the underlying data), and
/// compares/orders by its dense `num` rather than by content, matching the
/// teacher's `Production` (which orders by `ident`).
#[derive(Debug, Clone)]
pub struct Production(Rc<ProductionData>);

impl Production {
    pub fn id(&self) -> ProductionId {
        self.0.id
    }

    pub fn num(&self) -> u16 {
        self.0.num
    }

    pub fn lhs(&self) -> Symbol {
        self.0.lhs
    }

    pub fn rhs(&self) -> &[Symbol] {
        &self.0.rhs
    }

    pub fn len(&self) -> usize {
        self.0.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.rhs.is_empty()
    }
}

impl PartialEq for Production {
    fn eq(&self, other: &Self) -> bool {
        self.0.num == other.0.num
    }
}
impl Eq for Production {}

impl PartialOrd for Production {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Production {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.num.cmp(&other.0.num)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.0.lhs)?;
        if self.0.rhs.is_empty() {
            write!(f, " <empty>")?;
        } else {
            for symbol in &self.0.rhs {
                write!(f, " {}", symbol)?;
            }
        }
        Ok(())
    }
}

/// Append-only collection of productions, deduped by content hash and
/// indexed by LHS for alternative lookup (spec.md §4.2).
#[derive(Debug, Default)]
pub struct ProductionSet {
    by_id: BTreeMap<ProductionId, Production>,
    by_num: Vec<Production>,
    by_lhs: BTreeMap<Symbol, Vec<Production>>,
    start_symbol: Option<Symbol>,
}

impl ProductionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the augmented start symbol; the first production appended whose
    /// LHS equals it receives production number 1, all others are numbered
    /// sequentially from 2 (spec.md §3).
    pub fn set_start_symbol(&mut self, start: Symbol) {
        self.start_symbol = Some(start);
    }

    /// Appends a production, returning `false` if an identical (by content
    /// hash) production already exists.
    pub fn append(&mut self, lhs: Symbol, rhs: Vec<Symbol>) -> bool {
        let id = hash_production(lhs, &rhs);
        if self.by_id.contains_key(&id) {
            return false;
        }
        let num = if Some(lhs) == self.start_symbol && !self.by_num.iter().any(|p| p.lhs() == lhs)
        {
            1
        } else {
            let next = self.by_num.len() as u16 + 1;
            if next == 1 {
                2
            } else {
                next
            }
        };
        let production = Production(Rc::new(ProductionData { id, num, lhs, rhs }));
        self.by_id.insert(id, production.clone());
        self.by_num.push(production.clone());
        self.by_lhs.entry(lhs).or_default().push(production);
        true
    }

    pub fn find_by_id(&self, id: &ProductionId) -> Option<&Production> {
        self.by_id.get(id)
    }

    pub fn find_by_lhs(&self, lhs: Symbol) -> &[Production] {
        self.by_lhs.get(&lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Production> {
        self.by_num.iter()
    }

    pub fn len(&self) -> usize {
        self.by_num.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_num.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{SymbolTable};

    #[test]
    fn duplicate_alternatives_are_rejected() {
        let mut table = SymbolTable::new();
        let s = table.register_start("S'").unwrap();
        let a = table.register_terminal("a").unwrap();
        let mut set = ProductionSet::new();
        set.set_start_symbol(s);
        assert!(set.append(s, vec![a]));
        assert!(!set.append(s, vec![a]));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn start_production_is_numbered_one() {
        let mut table = SymbolTable::new();
        let s = table.register_start("S'").unwrap();
        let x = table.register_non_terminal("X").unwrap();
        let a = table.register_terminal("a").unwrap();
        let mut set = ProductionSet::new();
        set.set_start_symbol(s);
        set.append(x, vec![a.clone()]);
        set.append(s, vec![x]);
        let start_prod = set.find_by_lhs(s)[0].clone();
        assert_eq!(start_prod.num(), 1);
        let other = set.find_by_lhs(x)[0].clone();
        assert_eq!(other.num(), 2);
    }

    #[test]
    fn find_by_lhs_returns_all_alternatives() {
        let mut table = SymbolTable::new();
        let s = table.register_start("S'").unwrap();
        let x = table.register_non_terminal("X").unwrap();
        let a = table.register_terminal("a").unwrap();
        let b = table.register_terminal("b").unwrap();
        let mut set = ProductionSet::new();
        set.set_start_symbol(s);
        set.append(x, vec![a]);
        set.append(x, vec![b]);
        assert_eq!(set.find_by_lhs(x).len(), 2);
    }
}
