//! Grammar builder orchestration (spec.md §4.10): AST → symbol table →
//! production set → directives → precedence/associativity, with semantic
//! errors accumulated rather than aborting on the first one.
//!
//! Grounded on the teacher's `Specification`/`Grammar::try_from` (`grammar.rs`
//! in `alap_gen_ng`): the accumulate-then-report-unused-and-undefined-symbols
//! shape at the end of `try_from` is followed directly, re-targeted at this
//! crate's `Symbol`/`Production`/`PrecedenceMap` types and spec.md §4.10's
//! nine explicit steps instead of the teacher's single undifferentiated
//! parse-then-check pass.

pub mod compile;
pub mod error;
pub mod lexical;

use crate::ast::{Associativity as AstAssociativity, Element, GrammarAst, LexicalDirective};
use crate::diagnostic::Diagnostics;
use crate::precedence::{Associativity, PrecedenceMap};
use crate::production::{Production, ProductionSet};
use crate::symbol::{Symbol, SymbolTable};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use error::GrammarError;

fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn convert_associativity(a: AstAssociativity) -> Associativity {
    match a {
        AstAssociativity::Left => Associativity::Left,
        AstAssociativity::Right => Associativity::Right,
        AstAssociativity::NonAssoc => Associativity::NonAssoc,
    }
}

/// Everything the lexical compiler and table builder need out of grammar
/// building (spec.md §4.10's output feeding §4.4's pattern parser and
/// §4.9's table builder).
#[derive(Debug)]
pub struct CompiledGrammar {
    pub symbols: SymbolTable,
    pub productions: ProductionSet,
    pub precedence: PrecedenceMap,
    pub start_symbol: Symbol,
    pub error_symbol: Option<Symbol>,
    /// Pattern text for every terminal (anonymous and named), keyed by its
    /// symbol — the lexical compiler's input (spec.md §4.4/§4.5).
    pub terminal_patterns: BTreeMap<Symbol, String>,
    pub terminal_directives: BTreeMap<Symbol, Vec<LexicalDirective>>,
    /// Fragment name → pattern text, for `pattern::fragment::complete_fragments`.
    pub fragment_patterns: BTreeMap<String, String>,
    /// Per-production AST-action array (spec.md §6): positive = 1-based RHS
    /// position kept as-is, negative = the same position marked for
    /// expansion.
    pub ast_actions: BTreeMap<u16, Vec<i32>>,
}

struct PendingAlternative {
    production: Production,
    prec_override: Option<Symbol>,
}

/// Runs all nine steps of spec.md §4.10 over an already-parsed grammar AST,
/// returning a best-effort `CompiledGrammar` alongside every accumulated
/// diagnostic (errors never short-circuit earlier steps).
pub fn build(ast: &GrammarAst) -> (CompiledGrammar, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let mut errors: Vec<GrammarError> = Vec::new();

    if ast.name.is_none() {
        errors.push(GrammarError::MissingGrammarName);
    }
    if ast.non_terminals.is_empty() {
        errors.push(GrammarError::NoProductions);
    }

    let mut symbols = SymbolTable::new();

    // Step 1: anonymous terminals first (in first-encountered order), then
    // named terminals, then fragments.
    let mut terminal_patterns: BTreeMap<Symbol, String> = BTreeMap::new();
    let mut anonymous_by_text: BTreeMap<String, Symbol> = BTreeMap::new();
    for nt in &ast.non_terminals {
        for alt in &nt.alternatives {
            for element in &alt.elements {
                if let Element::Pattern(text) = element {
                    if !anonymous_by_text.contains_key(text) {
                        let synthetic = format!("__{}__", anonymous_by_text.len() + 1);
                        match symbols.register_terminal(&synthetic) {
                            Ok(symbol) => {
                                anonymous_by_text.insert(text.clone(), symbol);
                                terminal_patterns.insert(symbol, text.clone());
                            }
                            Err(_) => errors.push(GrammarError::SymbolLimitExceeded { row: alt.row, name: synthetic }),
                        }
                    }
                }
            }
        }
    }

    let mut terminal_rows: BTreeMap<String, u32> = BTreeMap::new();
    let mut terminal_directives: BTreeMap<Symbol, Vec<LexicalDirective>> = BTreeMap::new();
    for terminal in &ast.terminals {
        if terminal_rows.contains_key(&terminal.name) {
            errors.push(GrammarError::DuplicateTerminal { row: terminal.row, name: terminal.name.clone() });
            continue;
        }
        terminal_rows.insert(terminal.name.clone(), terminal.row);
        let symbol = match symbols.register_terminal(&terminal.name) {
            Ok(symbol) => symbol,
            Err(_) => {
                errors.push(GrammarError::SymbolLimitExceeded { row: terminal.row, name: terminal.name.clone() });
                continue;
            }
        };
        terminal_patterns.insert(symbol, terminal.pattern.clone());

        // Step 2: validate lexical directives.
        let mut validated = Vec::new();
        for directive in &terminal.directives {
            let ok = match directive {
                LexicalDirective::Mode(name) | LexicalDirective::Push(name) => !name.trim().is_empty(),
                LexicalDirective::Alias(name) => is_valid_identifier(name),
                LexicalDirective::Pop | LexicalDirective::Skip => true,
            };
            if ok {
                validated.push(directive.clone());
            } else {
                let directive_name = match directive {
                    LexicalDirective::Mode(_) => "mode",
                    LexicalDirective::Push(_) => "push",
                    LexicalDirective::Pop => "pop",
                    LexicalDirective::Skip => "skip",
                    LexicalDirective::Alias(_) => "alias",
                };
                errors.push(GrammarError::InvalidDirectiveParameter { row: terminal.row, directive: directive_name.to_string() });
            }
        }
        terminal_directives.insert(symbol, validated);
    }

    let mut fragment_patterns: BTreeMap<String, String> = BTreeMap::new();
    for fragment in &ast.fragments {
        if fragment_patterns.contains_key(&fragment.name) {
            errors.push(GrammarError::DuplicateFragment { row: fragment.row, name: fragment.name.clone() });
            continue;
        }
        fragment_patterns.insert(fragment.name.clone(), fragment.pattern.clone());
    }

    let error_symbol = terminal_rows.contains_key("error").then(|| symbols.to_symbol("error")).flatten();

    // Step 3: augmented start production.
    let augmented_name = format!("{}'", ast.start);
    let start_prime = symbols
        .register_start(&augmented_name)
        .expect("register_start cannot fail on the first call of a fresh SymbolTable");
    let user_start = symbols
        .register_non_terminal(&ast.start)
        .expect("non-terminal limit cannot be exceeded on the very first registration");

    let mut productions = ProductionSet::new();
    productions.set_start_symbol(start_prime);
    productions.append(start_prime, vec![user_start]);

    // Step 4: register all declared non-terminals.
    let mut non_terminal_rows: BTreeMap<Symbol, u32> = BTreeMap::new();
    for nt in &ast.non_terminals {
        if nt.name == "error" {
            errors.push(GrammarError::ReservedErrorSymbol { row: nt.row });
            continue;
        }
        if terminal_rows.contains_key(&nt.name) {
            errors.push(GrammarError::DuplicateNameBetweenTerminalAndNonTerminal { row: nt.row, name: nt.name.clone() });
        }
        match symbols.register_non_terminal(&nt.name) {
            Ok(symbol) => {
                non_terminal_rows.entry(symbol).or_insert(nt.row);
            }
            Err(_) => errors.push(GrammarError::SymbolLimitExceeded { row: nt.row, name: nt.name.clone() }),
        }
    }

    // Step 5-6: resolve alternatives, validate ast-shape directives.
    let mut pending: Vec<PendingAlternative> = Vec::new();
    let mut ast_actions: BTreeMap<u16, Vec<i32>> = BTreeMap::new();
    for nt in &ast.non_terminals {
        if nt.name == "error" {
            continue;
        }
        let lhs = match symbols.to_symbol(&nt.name) {
            Some(symbol) => symbol,
            None => continue,
        };
        for alt in &nt.alternatives {
            let mut rhs = Vec::with_capacity(alt.elements.len());
            let mut resolved = true;
            for element in &alt.elements {
                let symbol = match element {
                    Element::Pattern(text) => anonymous_by_text.get(text).copied(),
                    Element::Name(name) if name == "error" => error_symbol,
                    Element::Name(name) => symbols.to_symbol(name),
                };
                match symbol {
                    Some(symbol) => rhs.push(symbol),
                    None => {
                        if let Element::Name(name) = element {
                            errors.push(GrammarError::UndefinedSymbol { row: alt.row, name: name.clone() });
                        }
                        resolved = false;
                    }
                }
            }
            if !resolved {
                continue;
            }

            for directive in &alt.ast_directives {
                if directive.position == 0 || directive.position > rhs.len() {
                    errors.push(GrammarError::InvalidAstDirective {
                        row: alt.row,
                        reason: format!("position {} is out of range for a {}-element alternative", directive.position, rhs.len()),
                    });
                } else if directive.expand && !rhs[directive.position - 1].is_non_terminal() {
                    errors.push(GrammarError::InvalidAstDirective {
                        row: alt.row,
                        reason: format!("position {} is not a non-terminal, so it cannot expand", directive.position),
                    });
                }
            }

            let prec_override = alt.prec_override.as_deref().and_then(|name| symbols.to_symbol(name)).filter(|s| s.is_terminal());
            if !productions.append(lhs, rhs.clone()) {
                errors.push(GrammarError::DuplicateProduction { row: alt.row, lhs: nt.name.clone() });
                continue;
            }
            let production = productions
                .find_by_lhs(lhs)
                .last()
                .expect("the alternative accepted above must be the last one appended for this lhs")
                .clone();

            let action: Vec<i32> = (1..=rhs.len() as i32)
                .map(|position| {
                    let expands = alt.ast_directives.iter().any(|d| d.position as i32 == position && d.expand);
                    if expands {
                        -position
                    } else {
                        position
                    }
                })
                .collect();
            ast_actions.insert(production.num(), action);

            pending.push(PendingAlternative { production, prec_override });
        }
    }

    // Step 7: precedence/associativity declarations, in declaration order.
    let mut precedence = PrecedenceMap::new();
    let mut declared: BTreeMap<Symbol, AstAssociativity> = BTreeMap::new();
    for decl in &ast.precedence {
        let mut decl_symbols = Vec::new();
        for name in &decl.terminals {
            match symbols.to_symbol(name).filter(|s| s.is_terminal()) {
                Some(symbol) => {
                    match declared.get(&symbol) {
                        Some(previous) if *previous != decl.associativity => {
                            errors.push(GrammarError::DuplicateAssociativityDeclaration { row: decl.row, name: name.clone() });
                        }
                        _ => {
                            declared.insert(symbol, decl.associativity);
                        }
                    }
                    decl_symbols.push(symbol);
                }
                None => errors.push(GrammarError::UndefinedSymbol { row: decl.row, name: name.clone() }),
            }
        }
        precedence.declare(convert_associativity(decl.associativity), &decl_symbols);
    }

    // Step 8: per-production precedence, now that declarations are in.
    for entry in &pending {
        precedence.derive_production_prec(&entry.production, entry.prec_override);
    }

    // Step 9: unused-symbol detection by reachability from the start symbol.
    let mut reachable_non_terminals: BTreeSet<Symbol> = BTreeSet::new();
    let mut used_terminals: BTreeSet<Symbol> = BTreeSet::new();
    let mut queue: VecDeque<Symbol> = VecDeque::new();
    reachable_non_terminals.insert(start_prime);
    queue.push_back(start_prime);
    while let Some(nt) = queue.pop_front() {
        for production in productions.find_by_lhs(nt) {
            for &symbol in production.rhs() {
                if symbol.is_terminal() {
                    used_terminals.insert(symbol);
                } else if reachable_non_terminals.insert(symbol) {
                    queue.push_back(symbol);
                }
            }
        }
    }

    for (name, &row) in &terminal_rows {
        let symbol = symbols.to_symbol(name).expect("just registered above");
        let carries_skip = terminal_directives.get(&symbol).map(|ds| ds.iter().any(|d| matches!(d, LexicalDirective::Skip))).unwrap_or(false);
        let used = used_terminals.contains(&symbol);
        if carries_skip && used {
            errors.push(GrammarError::TerminalCannotBeSkipped { row, name: name.clone() });
        } else if !used && !carries_skip {
            errors.push(GrammarError::UnusedTerminal { row, name: name.clone() });
        }
    }
    for (&symbol, &row) in &non_terminal_rows {
        if symbol != user_start && !reachable_non_terminals.contains(&symbol) {
            let name = symbols.to_text(symbol).unwrap_or("?").to_string();
            errors.push(GrammarError::UnusedNonTerminal { row, name });
        }
    }

    for error in &errors {
        diagnostics.push(error.to_diagnostic());
    }

    let compiled = CompiledGrammar {
        symbols,
        productions,
        precedence,
        start_symbol: start_prime,
        error_symbol,
        terminal_patterns,
        terminal_directives,
        fragment_patterns,
        ast_actions,
    };
    (compiled, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn name_alt(elements: &[&str], row: u32) -> Alternative {
        Alternative {
            elements: elements.iter().map(|e| Element::Name(e.to_string())).collect(),
            prec_override: None,
            ast_directives: Vec::new(),
            row,
        }
    }

    #[test]
    fn minimal_grammar_compiles_with_one_shift_and_one_reduce() {
        // s: "a"; — end-to-end scenario 1 (spec.md §8).
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
        let (grammar, diagnostics) = build(&ast);
        assert!(!diagnostics.has_errors());
        assert_eq!(grammar.productions.len(), 2); // augmented start + s -> "a"
        assert_eq!(grammar.terminal_patterns.len(), 1);
    }

    #[test]
    fn duplicate_terminal_declaration_is_one_error_at_the_second_row() {
        let ast = GrammarAst {
            name: Some("g".into()),
            start: "s".into(),
            precedence: Vec::new(),
            terminals: vec![
                TerminalDecl { name: "NUM".into(), pattern: "[0-9]+".into(), directives: Vec::new(), row: 2 },
                TerminalDecl { name: "NUM".into(), pattern: "[0-9]+".into(), directives: Vec::new(), row: 5 },
            ],
            fragments: Vec::new(),
            non_terminals: vec![NonTerminalDecl { name: "s".into(), row: 1, alternatives: vec![name_alt(&["NUM"], 1)] }],
        };
        let (_, diagnostics) = build(&ast);
        let errors: Vec<_> = diagnostics.iter().filter(|d| d.severity == crate::diagnostic::Severity::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 5);
    }

    #[test]
    fn undefined_non_terminal_reference_is_reported() {
        let ast = GrammarAst {
            name: Some("g".into()),
            start: "s".into(),
            precedence: Vec::new(),
            terminals: Vec::new(),
            fragments: Vec::new(),
            non_terminals: vec![NonTerminalDecl { name: "s".into(), row: 1, alternatives: vec![name_alt(&["missing"], 1)] }],
        };
        let (_, diagnostics) = build(&ast);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn unused_skip_terminal_is_not_reported_but_used_skip_terminal_is_an_error() {
        let ast = GrammarAst {
            name: Some("g".into()),
            start: "s".into(),
            precedence: Vec::new(),
            terminals: vec![
                TerminalDecl { name: "WS".into(), pattern: " +".into(), directives: vec![LexicalDirective::Skip], row: 2 },
                TerminalDecl { name: "A".into(), pattern: "a".into(), directives: Vec::new(), row: 3 },
            ],
            fragments: Vec::new(),
            non_terminals: vec![NonTerminalDecl { name: "s".into(), row: 1, alternatives: vec![name_alt(&["A"], 1)] }],
        };
        let (_, diagnostics) = build(&ast);
        assert!(!diagnostics.has_errors());

        let ast_misused = GrammarAst {
            non_terminals: vec![NonTerminalDecl { name: "s".into(), row: 1, alternatives: vec![name_alt(&["WS"], 1)] }],
            ..ast
        };
        let (_, diagnostics) = build(&ast_misused);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn reserved_error_symbol_cannot_be_a_non_terminal() {
        let ast = GrammarAst {
            name: Some("g".into()),
            start: "s".into(),
            precedence: Vec::new(),
            terminals: Vec::new(),
            fragments: Vec::new(),
            non_terminals: vec![
                NonTerminalDecl { name: "s".into(), row: 1, alternatives: vec![name_alt(&["error"], 1)] },
                NonTerminalDecl { name: "error".into(), row: 2, alternatives: vec![] },
            ],
        };
        let (_, diagnostics) = build(&ast);
        assert!(diagnostics.has_errors());
    }
}
