//! Bit-packed symbol codes and the bijective symbol table (spec.md §3, §4.1).
//!
//! The teacher (`alap_gen_ng::symbol`) represents symbols as `Rc`-shared,
//! structurally-compared `Token`/`NonTerminal` handles. spec.md calls that
//! out as a redesign point: symbols here are a single `Copy` 16-bit code, and
//! all kind/number/start/eof queries are encapsulated behind `Symbol`'s
//! methods so the bit layout never leaks.

use std::collections::BTreeMap;
use std::fmt;

const KIND_BIT: u16 = 0x8000;
const NUMBER_MASK: u16 = 0x3FFF;
const MAX_NUMBER: u16 = NUMBER_MASK;
const RESERVED_NUMBER: u16 = 1;
const FIRST_ORDINARY_NUMBER: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolKind {
    NonTerminal,
    Terminal,
}

/// A tagged symbol code: kind bit + 14-bit dense number. `Symbol::NIL` (0) is
/// the only code with no kind; every other code is either a terminal or a
/// non-terminal. Number 1 is reserved: the augmented start non-terminal in
/// the non-terminal space, `EOF` in the terminal space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u16);

impl Symbol {
    pub const NIL: Symbol = Symbol(0);

    fn new(kind: SymbolKind, number: u16) -> Self {
        debug_assert!(number > 0 && number <= MAX_NUMBER);
        let kind_bit = match kind {
            SymbolKind::NonTerminal => 0,
            SymbolKind::Terminal => KIND_BIT,
        };
        Symbol(kind_bit | number)
    }

    pub fn is_nil(self) -> bool {
        self.0 == 0
    }

    pub fn kind(self) -> Option<SymbolKind> {
        if self.is_nil() {
            None
        } else if self.0 & KIND_BIT != 0 {
            Some(SymbolKind::Terminal)
        } else {
            Some(SymbolKind::NonTerminal)
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self.kind(), Some(SymbolKind::Terminal))
    }

    pub fn is_non_terminal(self) -> bool {
        matches!(self.kind(), Some(SymbolKind::NonTerminal))
    }

    pub fn number(self) -> u16 {
        self.0 & NUMBER_MASK
    }

    pub fn is_start(self) -> bool {
        self.is_non_terminal() && self.number() == RESERVED_NUMBER
    }

    pub fn is_eof(self) -> bool {
        self.is_terminal() && self.number() == RESERVED_NUMBER
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_nil() {
            write!(f, "<nil>")
        } else {
            write!(f, "{:?}#{}", self.kind().unwrap(), self.number())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    StartAlreadyRegistered,
    SymbolLimitExceeded(SymbolKind),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::StartAlreadyRegistered => write!(f, "start symbol already registered"),
            Error::SymbolLimitExceeded(kind) => write!(f, "symbol limit exceeded for {:?}", kind),
        }
    }
}

/// Two one-way maps (text→symbol, symbol→text) plus the dense per-kind text
/// arrays spec.md §4.1 calls for. Written only during grammar building;
/// read-only thereafter (spec.md §5).
#[derive(Debug, Default)]
pub struct SymbolTable {
    text_to_terminal: BTreeMap<String, Symbol>,
    text_to_non_terminal: BTreeMap<String, Symbol>,
    terminal_texts: Vec<String>,
    non_terminal_texts: Vec<String>,
    start_registered: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self::default();
        // index 0 is the Nil placeholder so `terminal_texts[number]` lines up
        // with the 1-based symbol numbers; index 1 is reserved for EOF.
        table.terminal_texts.push(String::new());
        table.terminal_texts.push("EOF".to_string());
        table.text_to_terminal.insert("EOF".to_string(), Symbol::new(SymbolKind::Terminal, RESERVED_NUMBER));
        table.non_terminal_texts.push(String::new());
        table.non_terminal_texts.push(String::new());
        table
    }

    pub fn eof(&self) -> Symbol {
        Symbol::new(SymbolKind::Terminal, RESERVED_NUMBER)
    }

    pub fn register_start(&mut self, text: &str) -> Result<Symbol, Error> {
        if self.start_registered {
            return Err(Error::StartAlreadyRegistered);
        }
        self.start_registered = true;
        self.non_terminal_texts[RESERVED_NUMBER as usize] = text.to_string();
        let symbol = Symbol::new(SymbolKind::NonTerminal, RESERVED_NUMBER);
        self.text_to_non_terminal.insert(text.to_string(), symbol);
        Ok(symbol)
    }

    pub fn register_terminal(&mut self, text: &str) -> Result<Symbol, Error> {
        if let Some(&symbol) = self.text_to_terminal.get(text) {
            return Ok(symbol);
        }
        let number = self.terminal_texts.len() as u16;
        if number > MAX_NUMBER {
            return Err(Error::SymbolLimitExceeded(SymbolKind::Terminal));
        }
        let number = if number < FIRST_ORDINARY_NUMBER { FIRST_ORDINARY_NUMBER } else { number };
        let symbol = Symbol::new(SymbolKind::Terminal, number);
        self.terminal_texts.push(text.to_string());
        self.text_to_terminal.insert(text.to_string(), symbol);
        Ok(symbol)
    }

    pub fn register_non_terminal(&mut self, text: &str) -> Result<Symbol, Error> {
        if let Some(&symbol) = self.text_to_non_terminal.get(text) {
            return Ok(symbol);
        }
        let number = self.non_terminal_texts.len() as u16;
        if number > MAX_NUMBER {
            return Err(Error::SymbolLimitExceeded(SymbolKind::NonTerminal));
        }
        let number = if number < FIRST_ORDINARY_NUMBER { FIRST_ORDINARY_NUMBER } else { number };
        let symbol = Symbol::new(SymbolKind::NonTerminal, number);
        self.non_terminal_texts.push(text.to_string());
        self.text_to_non_terminal.insert(text.to_string(), symbol);
        Ok(symbol)
    }

    pub fn to_symbol(&self, text: &str) -> Option<Symbol> {
        self.text_to_terminal
            .get(text)
            .or_else(|| self.text_to_non_terminal.get(text))
            .copied()
    }

    pub fn to_text(&self, symbol: Symbol) -> Option<&str> {
        match symbol.kind()? {
            SymbolKind::Terminal => self.terminal_texts.get(symbol.number() as usize).map(String::as_str),
            SymbolKind::NonTerminal => self.non_terminal_texts.get(symbol.number() as usize).map(String::as_str),
        }
    }

    /// Terminals in ascending number order (EOF first).
    pub fn terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        (1..self.terminal_texts.len() as u16).map(|n| Symbol::new(SymbolKind::Terminal, n))
    }

    /// Non-terminals in ascending number order (start symbol first, once registered).
    pub fn non_terminals(&self) -> impl Iterator<Item = Symbol> + '_ {
        let lo = if self.start_registered { 1 } else { 2 };
        (lo..self.non_terminal_texts.len() as u16).map(|n| Symbol::new(SymbolKind::NonTerminal, n))
    }

    pub fn terminal_count(&self) -> usize {
        self.terminal_texts.len().saturating_sub(1)
    }

    pub fn non_terminal_count(&self) -> usize {
        self.non_terminal_texts.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_is_preregistered() {
        let table = SymbolTable::new();
        let eof = table.to_symbol("EOF").unwrap();
        assert!(eof.is_eof());
        assert_eq!(table.to_text(eof), Some("EOF"));
    }

    #[test]
    fn start_symbol_reserved_number_one() {
        let mut table = SymbolTable::new();
        let start = table.register_start("S'").unwrap();
        assert!(start.is_start());
        assert_eq!(start.number(), 1);
        assert_eq!(table.register_start("S''"), Err(Error::StartAlreadyRegistered));
    }

    #[test]
    fn terminals_and_non_terminals_share_no_text() {
        let mut table = SymbolTable::new();
        let a = table.register_terminal("a").unwrap();
        let b = table.register_non_terminal("b").unwrap();
        assert!(a.is_terminal());
        assert!(b.is_non_terminal());
        assert_ne!(table.to_symbol("a"), table.to_symbol("b"));
    }

    #[test]
    fn registering_same_text_twice_is_idempotent() {
        let mut table = SymbolTable::new();
        let a1 = table.register_terminal("num").unwrap();
        let a2 = table.register_terminal("num").unwrap();
        assert_eq!(a1, a2);
    }

    #[test]
    fn enumeration_is_number_ordered() {
        let mut table = SymbolTable::new();
        table.register_terminal("z").unwrap();
        table.register_terminal("a").unwrap();
        let nums: Vec<u16> = table.terminals().map(|s| s.number()).collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }
}
