//! Named pattern-syntax error kinds (spec.md §4.4). The teacher's own
//! `LexanError` (`lexan/src/error.rs`) is a flat enum over a handful of
//! regex-crate-delegated failure modes; this one is larger because this
//! crate parses patterns itself instead of delegating to the `regex` crate,
//! but keeps the same "one named variant per failure, `Display` renders it"
//! shape.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    NullPattern,
    AltLackOfOperand,
    RepNoTarget,
    GroupUnclosed,
    GroupNoElem,
    GroupNoInitiator,
    GroupInvalidForm,
    BExpUnclosed,
    BExpNoElem,
    BExpInvalidForm,
    RangeInvalidOrder,
    RangePropIsUnavailable,
    RangeInvalidForm,
    CPExpInvalidForm,
    CPExpOutOfRange,
    CharPropExpInvalidForm,
    CharPropExpUnsupported(String),
    FragmentExpInvalidForm,
    UnmatchablePattern,
    IncompletedEscSeq,
    InvalidEscSeq(char),
    InvalidCodePoint(u32),
    UndefinedFragment(String),
    CyclicFragment(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatternError::NullPattern => write!(f, "pattern is empty"),
            PatternError::AltLackOfOperand => write!(f, "'|' is missing an operand"),
            PatternError::RepNoTarget => write!(f, "repetition operator has no target"),
            PatternError::GroupUnclosed => write!(f, "group is not closed with ')'"),
            PatternError::GroupNoElem => write!(f, "group has no element"),
            PatternError::GroupNoInitiator => write!(f, "unmatched ')'"),
            PatternError::GroupInvalidForm => write!(f, "group has an invalid form"),
            PatternError::BExpUnclosed => write!(f, "bracket expression is not closed with ']'"),
            PatternError::BExpNoElem => write!(f, "bracket expression has no element"),
            PatternError::BExpInvalidForm => write!(f, "bracket expression has an invalid form"),
            PatternError::RangeInvalidOrder => write!(f, "range is not in ascending order"),
            PatternError::RangePropIsUnavailable => {
                write!(f, "character property is not allowed inside a range")
            }
            PatternError::RangeInvalidForm => write!(f, "range has an invalid form"),
            PatternError::CPExpInvalidForm => write!(f, "\\u{{...}} has an invalid form"),
            PatternError::CPExpOutOfRange => write!(f, "code point exceeds U+10FFFF"),
            PatternError::CharPropExpInvalidForm => write!(f, "\\p{{...}} has an invalid form"),
            PatternError::CharPropExpUnsupported(name) => {
                write!(f, "character property \"{}\" is unsupported", name)
            }
            PatternError::FragmentExpInvalidForm => write!(f, "\\f{{...}} has an invalid form"),
            PatternError::UnmatchablePattern => {
                write!(f, "inverse expression excludes the entire code point range")
            }
            PatternError::IncompletedEscSeq => write!(f, "incomplete escape sequence"),
            PatternError::InvalidEscSeq(c) => write!(f, "invalid escape sequence '\\{}'", c),
            PatternError::InvalidCodePoint(cp) => write!(f, "invalid code point U+{:X}", cp),
            PatternError::UndefinedFragment(name) => write!(f, "undefined fragment \"{}\"", name),
            PatternError::CyclicFragment(name) => write!(f, "cyclic fragment \"{}\"", name),
        }
    }
}
