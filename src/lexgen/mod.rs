//! Byte tree and DFA construction (spec.md §4.5).

pub mod augment;
pub mod byte_tree;
pub mod compress;
pub mod dfa;

pub use augment::augment;
pub use byte_tree::{build_combined_tree, convert, ByteTree};
pub use compress::{compress, CompressedTransition};
pub use dfa::{build_dfa, Dfa};
