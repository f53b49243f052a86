//! Semantic error kinds for grammar building (spec.md §7). Named variants,
//! not bare strings, mirroring `pattern::error::PatternError`'s shape; each
//! carries its own row so the caller can build a `Diagnostic` without
//! re-deriving it.

use crate::diagnostic::Diagnostic;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    UnknownDirective { row: u32, name: String },
    InvalidDirectiveParameter { row: u32, directive: String },
    DuplicateProduction { row: u32, lhs: String },
    DuplicateTerminal { row: u32, name: String },
    DuplicateFragment { row: u32, name: String },
    DuplicateNameBetweenTerminalAndNonTerminal { row: u32, name: String },
    UnusedTerminal { row: u32, name: String },
    UnusedNonTerminal { row: u32, name: String },
    TerminalCannotBeSkipped { row: u32, name: String },
    ReservedErrorSymbol { row: u32 },
    MissingGrammarName,
    NoProductions,
    UndefinedSymbol { row: u32, name: String },
    DuplicateAssociativityDeclaration { row: u32, name: String },
    InvalidLabel { row: u32, label: String },
    InvalidAstDirective { row: u32, reason: String },
    SymbolLimitExceeded { row: u32, name: String },
}

impl GrammarError {
    pub fn row(&self) -> u32 {
        match self {
            GrammarError::UnknownDirective { row, .. }
            | GrammarError::InvalidDirectiveParameter { row, .. }
            | GrammarError::DuplicateProduction { row, .. }
            | GrammarError::DuplicateTerminal { row, .. }
            | GrammarError::DuplicateFragment { row, .. }
            | GrammarError::DuplicateNameBetweenTerminalAndNonTerminal { row, .. }
            | GrammarError::UnusedTerminal { row, .. }
            | GrammarError::UnusedNonTerminal { row, .. }
            | GrammarError::TerminalCannotBeSkipped { row, .. }
            | GrammarError::ReservedErrorSymbol { row }
            | GrammarError::UndefinedSymbol { row, .. }
            | GrammarError::DuplicateAssociativityDeclaration { row, .. }
            | GrammarError::InvalidLabel { row, .. }
            | GrammarError::InvalidAstDirective { row, .. }
            | GrammarError::SymbolLimitExceeded { row, .. } => *row,
            GrammarError::MissingGrammarName | GrammarError::NoProductions => 0,
        }
    }

    /// Unused-symbol reports are warnings (spec.md §7's "conflict
    /// diagnostics... not errors" carve-out extends to unused-symbol
    /// reporting in this crate's reading of §4.10 step 9); everything else
    /// is a hard error.
    pub fn is_warning(&self) -> bool {
        matches!(self, GrammarError::UnusedTerminal { .. } | GrammarError::UnusedNonTerminal { .. })
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let row = self.row() as usize;
        if self.is_warning() {
            Diagnostic::warning(row, 0, self.to_string())
        } else {
            Diagnostic::error(row, 0, self.to_string())
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GrammarError::UnknownDirective { name, .. } => write!(f, "unknown directive \"{}\"", name),
            GrammarError::InvalidDirectiveParameter { directive, .. } => {
                write!(f, "invalid parameter for directive \"{}\"", directive)
            }
            GrammarError::DuplicateProduction { lhs, .. } => write!(f, "duplicate alternative for \"{}\"", lhs),
            GrammarError::DuplicateTerminal { name, .. } => write!(f, "terminal \"{}\" declared more than once", name),
            GrammarError::DuplicateFragment { name, .. } => write!(f, "fragment \"{}\" declared more than once", name),
            GrammarError::DuplicateNameBetweenTerminalAndNonTerminal { name, .. } => {
                write!(f, "\"{}\" is declared as both a terminal and a non-terminal", name)
            }
            GrammarError::UnusedTerminal { name, .. } => write!(f, "terminal \"{}\" is not used", name),
            GrammarError::UnusedNonTerminal { name, .. } => write!(f, "non terminal \"{}\" is not used", name),
            GrammarError::TerminalCannotBeSkipped { name, .. } => {
                write!(f, "terminal \"{}\" is used in a production and cannot carry `skip`", name)
            }
            GrammarError::ReservedErrorSymbol { .. } => write!(f, "\"error\" is reserved and cannot be used as a non-terminal"),
            GrammarError::MissingGrammarName => write!(f, "grammar has no name"),
            GrammarError::NoProductions => write!(f, "grammar has no productions"),
            GrammarError::UndefinedSymbol { name, .. } => write!(f, "\"{}\" is not defined", name),
            GrammarError::DuplicateAssociativityDeclaration { name, .. } => {
                write!(f, "\"{}\" already has a declared associativity", name)
            }
            GrammarError::InvalidLabel { label, .. } => write!(f, "invalid label \"{}\"", label),
            GrammarError::InvalidAstDirective { reason, .. } => write!(f, "invalid ast directive: {}", reason),
            GrammarError::SymbolLimitExceeded { name, .. } => write!(f, "symbol limit exceeded registering \"{}\"", name),
        }
    }
}
