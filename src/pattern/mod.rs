//! Pattern compilation: string → code-point tree (spec.md §4.4).

pub mod cpt;
pub mod error;
pub mod fragment;
pub mod oracle;
pub mod parser;

pub use cpt::CodePointTree;
pub use error::PatternError;
pub use oracle::{ByteRangeHelper, CharPropertyOracle, PropertyResolution, StandardByteRangeHelper};
pub use parser::parse;
