//! Assembles spec.md §6's "Compiled lexical spec" out of a `CompiledGrammar`
//! by running every terminal's pattern text through the pattern parser,
//! fragment completion and the byte-tree/DFA pipeline.
//!
//! Per the scope decision recorded in DESIGN.md, one combined DFA is built
//! across every terminal regardless of its declared `mode`; per-terminal
//! `mode`/`push`/`pop`/`skip`/`alias` directives ride alongside it as plain
//! metadata for a runtime driver to act on, since multi-mode stack
//! switching is that driver's job, not this crate's (spec.md §1).

use super::CompiledGrammar;
use crate::ast::LexicalDirective;
use crate::lexgen::{augment, build_combined_tree, build_dfa, Dfa};
use crate::pattern::{self, ByteRangeHelper, CharPropertyOracle};
use crate::symbol::Symbol;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TerminalLexicalInfo {
    pub mode: Option<String>,
    pub push: Option<String>,
    pub pop: bool,
    pub skip: bool,
    pub alias: Option<String>,
}

#[derive(Debug)]
pub struct CompiledLexicalSpec {
    /// Indexed by the DFA's accepting `kind` id (dense, ascending terminal
    /// number order).
    pub kind_names: Vec<String>,
    pub directives: Vec<TerminalLexicalInfo>,
    pub dfa: Dfa,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LexicalCompileError {
    Pattern(Symbol, pattern::PatternError),
    NoTerminals,
}

pub fn compile_lexical_spec(
    grammar: &CompiledGrammar,
    oracle: &dyn CharPropertyOracle,
    byte_helper: &dyn ByteRangeHelper,
) -> Result<CompiledLexicalSpec, LexicalCompileError> {
    let ordered_terminals: Vec<Symbol> = grammar.terminal_patterns.keys().copied().collect();
    if ordered_terminals.is_empty() {
        return Err(LexicalCompileError::NoTerminals);
    }

    let mut fragment_trees = BTreeMap::new();
    for (name, text) in &grammar.fragment_patterns {
        let tree = pattern::parse(text, oracle).map_err(|e| LexicalCompileError::Pattern(Symbol::NIL, e))?;
        fragment_trees.insert(name.clone(), tree);
    }

    let mut terminal_trees = Vec::with_capacity(ordered_terminals.len());
    for &symbol in &ordered_terminals {
        let text = &grammar.terminal_patterns[&symbol];
        let tree = pattern::parse(text, oracle).map_err(|e| LexicalCompileError::Pattern(symbol, e))?;
        terminal_trees.push(tree);
    }

    let (_, completed) = pattern::fragment::complete_fragments(&fragment_trees, &terminal_trees)
        .map_err(|e| LexicalCompileError::Pattern(Symbol::NIL, e))?;

    let kind_patterns: Vec<(u32, _)> = completed.into_iter().enumerate().map(|(i, tree)| (i as u32, tree)).collect();
    let combined = build_combined_tree(&kind_patterns, byte_helper).expect("fragments are fully resolved above");
    let augmented = augment(&combined);
    let dfa = build_dfa(&augmented, 1);

    let kind_names = ordered_terminals.iter().map(|&s| grammar.symbols.to_text(s).unwrap_or("?").to_string()).collect();
    let directives = ordered_terminals
        .iter()
        .map(|symbol| {
            let mut info = TerminalLexicalInfo::default();
            for directive in grammar.terminal_directives.get(symbol).into_iter().flatten() {
                match directive {
                    LexicalDirective::Mode(name) => info.mode = Some(name.clone()),
                    LexicalDirective::Push(name) => info.push = Some(name.clone()),
                    LexicalDirective::Pop => info.pop = true,
                    LexicalDirective::Skip => info.skip = true,
                    LexicalDirective::Alias(name) => info.alias = Some(name.clone()),
                }
            }
            info
        })
        .collect();

    Ok(CompiledLexicalSpec { kind_names, directives, dfa })
}
