//! Code-point tree → byte tree conversion (spec.md §4.5 "Conversion").
//!
//! No teacher module builds a byte-level automaton tree (the teacher and
//! every complete example repo in the pack hand matching off to the `regex`
//! crate), so this is new code grounded directly on spec.md's description;
//! it reuses `pattern::cpt::CodePointTree`'s "plain enum + `Box` fields"
//! shape.

use crate::pattern::{ByteRangeHelper, CodePointTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteTree {
    Range(u8, u8),
    EndMarker(u32),
    Concat(Box<ByteTree>, Box<ByteTree>),
    Alt(Box<ByteTree>, Box<ByteTree>),
    Repeat(Box<ByteTree>),
    Option(Box<ByteTree>),
}

impl ByteTree {
    fn alt(self, other: ByteTree) -> ByteTree {
        ByteTree::Alt(Box::new(self), Box::new(other))
    }
}

/// A pattern tree left unresolved at this stage is a builder bug, not a user
/// error: fragment completion (spec.md §4.4) must run before byte-tree
/// conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedFragment;

pub fn convert(tree: &CodePointTree, helper: &dyn ByteRangeHelper) -> Result<ByteTree, UnresolvedFragment> {
    match tree {
        CodePointTree::Range(a, b) => Ok(range_to_byte_tree(*a, *b, helper)),
        CodePointTree::Concat(l, r) => Ok(ByteTree::Concat(
            Box::new(convert(l, helper)?),
            Box::new(convert(r, helper)?),
        )),
        CodePointTree::Alt(l, r) => Ok(ByteTree::Alt(
            Box::new(convert(l, helper)?),
            Box::new(convert(r, helper)?),
        )),
        CodePointTree::Repeat(c) => Ok(ByteTree::Repeat(Box::new(convert(c, helper)?))),
        CodePointTree::Option(c) => Ok(ByteTree::Option(Box::new(convert(c, helper)?))),
        CodePointTree::Fragment(_, _) => Err(UnresolvedFragment),
        CodePointTree::Root { kind, child } => Ok(ByteTree::Concat(
            Box::new(convert(child, helper)?),
            Box::new(ByteTree::EndMarker(*kind)),
        )),
    }
}

/// Builds the alternation over every terminal kind's pattern, in ascending
/// kind-id order, so earlier kinds bias toward acceptance ties on a common
/// prefix (spec.md §4.5 "Conversion").
pub fn build_combined_tree(
    patterns: &[(u32, CodePointTree)],
    helper: &dyn ByteRangeHelper,
) -> Result<ByteTree, UnresolvedFragment> {
    let mut ordered: Vec<&(u32, CodePointTree)> = patterns.iter().collect();
    ordered.sort_by_key(|(kind, _)| *kind);
    let mut combined: Option<ByteTree> = None;
    for (kind, pattern) in ordered {
        let rooted = CodePointTree::Root {
            kind: *kind,
            child: Box::new(pattern.clone()),
        };
        let converted = convert(&rooted, helper)?;
        combined = Some(match combined {
            Some(tree) => tree.alt(converted),
            None => converted,
        });
    }
    combined.ok_or(UnresolvedFragment)
}

fn range_to_byte_tree(from: u32, to: u32, helper: &dyn ByteRangeHelper) -> ByteTree {
    let blocks = helper.generate_char_blocks(from, to);
    let mut tree: Option<ByteTree> = None;
    for (from_bytes, to_bytes) in blocks {
        let sequence = sequence_from_bytes(&from_bytes, &to_bytes);
        tree = Some(match tree {
            Some(t) => t.alt(sequence),
            None => sequence,
        });
    }
    tree.expect("generate_char_blocks must cover a non-empty code point range")
}

fn sequence_from_bytes(from: &[u8], to: &[u8]) -> ByteTree {
    let mut iter = from.iter().zip(to.iter());
    let (&f0, &t0) = iter.next().expect("byte sequence must have at least one byte");
    let mut tree = ByteTree::Range(f0, t0);
    for (&f, &t) in iter {
        tree = ByteTree::Concat(Box::new(tree), Box::new(ByteTree::Range(f, t)));
    }
    tree
}
