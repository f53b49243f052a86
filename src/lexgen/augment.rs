//! Position assignment and nullable/firstpos/lastpos/followpos (spec.md
//! §4.5, the standard Aho-Sethi-Ullman construction over the byte tree).
//!
//! New code grounded directly on spec.md's description; no corpus repo
//! implements this (the teacher and the other examples all delegate DFA
//! construction to the `regex` crate).

use super::byte_tree::ByteTree;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy)]
pub enum Position {
    Byte(u8, u8),
    EndMarker(u32),
}

/// The fully positioned tree: every leaf/end-marker numbered from 1, plus
/// the `followpos` table and the root's `firstpos` (the DFA's initial
/// state, per spec.md §4.5 "Subset construction").
pub struct Augmented {
    pub positions: Vec<Position>,
    pub followpos: BTreeMap<u32, BTreeSet<u32>>,
    pub root_firstpos: BTreeSet<u32>,
}

struct NodeInfo {
    nullable: bool,
    firstpos: BTreeSet<u32>,
    lastpos: BTreeSet<u32>,
}

struct Builder {
    positions: Vec<Position>,
    followpos: BTreeMap<u32, BTreeSet<u32>>,
}

impl Builder {
    fn assign_leaf(&mut self, position: Position) -> NodeInfo {
        self.positions.push(position);
        let pos = self.positions.len() as u32;
        NodeInfo {
            nullable: false,
            firstpos: std::iter::once(pos).collect(),
            lastpos: std::iter::once(pos).collect(),
        }
    }

    fn walk(&mut self, tree: &ByteTree) -> NodeInfo {
        match tree {
            ByteTree::Range(lo, hi) => self.assign_leaf(Position::Byte(*lo, *hi)),
            ByteTree::EndMarker(kind) => self.assign_leaf(Position::EndMarker(*kind)),
            ByteTree::Concat(l, r) => {
                let left = self.walk(l);
                let right = self.walk(r);
                for &p in &left.lastpos {
                    self.followpos.entry(p).or_default().extend(right.firstpos.iter().copied());
                }
                let nullable = left.nullable && right.nullable;
                let firstpos = if left.nullable {
                    left.firstpos.union(&right.firstpos).copied().collect()
                } else {
                    left.firstpos
                };
                let lastpos = if right.nullable {
                    left.lastpos.union(&right.lastpos).copied().collect()
                } else {
                    right.lastpos
                };
                NodeInfo { nullable, firstpos, lastpos }
            }
            ByteTree::Alt(l, r) => {
                let left = self.walk(l);
                let right = self.walk(r);
                NodeInfo {
                    nullable: left.nullable || right.nullable,
                    firstpos: left.firstpos.union(&right.firstpos).copied().collect(),
                    lastpos: left.lastpos.union(&right.lastpos).copied().collect(),
                }
            }
            ByteTree::Repeat(c) => {
                let inner = self.walk(c);
                for &p in &inner.lastpos {
                    self.followpos.entry(p).or_default().extend(inner.firstpos.iter().copied());
                }
                NodeInfo {
                    nullable: true,
                    firstpos: inner.firstpos,
                    lastpos: inner.lastpos,
                }
            }
            ByteTree::Option(c) => {
                let inner = self.walk(c);
                NodeInfo {
                    nullable: true,
                    firstpos: inner.firstpos,
                    lastpos: inner.lastpos,
                }
            }
        }
    }
}

/// Depth-first position assignment plus nullable/firstpos/lastpos/followpos,
/// in one traversal (spec.md §4.5 "Position assignment", "Nullable/first/
/// last", "Follow table").
pub fn augment(tree: &ByteTree) -> Augmented {
    let mut builder = Builder {
        positions: Vec::new(),
        followpos: BTreeMap::new(),
    };
    let root = builder.walk(tree);
    Augmented {
        positions: builder.positions,
        followpos: builder.followpos,
        root_firstpos: root.firstpos,
    }
}
