//! The code-point tree (CPT) and the exclusion operator it needs for
//! inverse brackets and inverse character properties (spec.md §3, §4.4).
//!
//! No teacher module builds a pattern AST (the teacher hands raw regex
//! strings straight to the `regex` crate), so this is grounded directly on
//! spec.md's algebraic description; naming follows the teacher's "plain enum
//! + recursive `Box` fields" style used elsewhere (e.g. `AttributeData`).

pub const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodePointTree {
    Range(u32, u32),
    Concat(Box<CodePointTree>, Box<CodePointTree>),
    Alt(Box<CodePointTree>, Box<CodePointTree>),
    Repeat(Box<CodePointTree>),
    Option(Box<CodePointTree>),
    Fragment(String, Option<Box<CodePointTree>>),
    Root { kind: u32, child: Box<CodePointTree> },
}

impl CodePointTree {
    pub fn concat(self, other: CodePointTree) -> CodePointTree {
        CodePointTree::Concat(Box::new(self), Box::new(other))
    }

    pub fn alt(self, other: CodePointTree) -> CodePointTree {
        CodePointTree::Alt(Box::new(self), Box::new(other))
    }

    /// Desugars `x+` to `x x*` since spec.md's CPT algebra has no dedicated
    /// one-or-more variant.
    pub fn one_or_more(self) -> CodePointTree {
        let repeat = CodePointTree::Repeat(Box::new(self.clone()));
        self.concat(repeat)
    }
}

/// Flattens a tree built purely from `Range`/`Alt` nodes (as brackets and
/// property resolutions produce) into a sorted, non-overlapping range list.
pub fn flatten_ranges(tree: &CodePointTree) -> Vec<(u32, u32)> {
    let mut ranges = Vec::new();
    collect_ranges(tree, &mut ranges);
    ranges.sort();
    merge_adjacent(ranges)
}

fn collect_ranges(tree: &CodePointTree, out: &mut Vec<(u32, u32)>) {
    match tree {
        CodePointTree::Range(from, to) => out.push((*from, *to)),
        CodePointTree::Alt(l, r) => {
            collect_ranges(l, out);
            collect_ranges(r, out);
        }
        _ => {}
    }
}

fn merge_adjacent(ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (from, to) in ranges {
        if let Some(last) = merged.last_mut() {
            if from <= last.1.saturating_add(1) {
                last.1 = last.1.max(to);
                continue;
            }
        }
        merged.push((from, to));
    }
    merged
}

pub fn ranges_to_tree(ranges: &[(u32, u32)]) -> Option<CodePointTree> {
    let mut iter = ranges.iter();
    let first = iter.next()?;
    let mut tree = CodePointTree::Range(first.0, first.1);
    for &(from, to) in iter {
        tree = tree.alt(CodePointTree::Range(from, to));
    }
    Some(tree)
}

/// Subtracts a single target range from a single base range, handling the
/// five overlap cases spec.md §4.4 names: no overlap, full cover, left
/// overlap, right overlap, strictly-inside (which splits into two).
fn subtract_one(base: (u32, u32), target: (u32, u32)) -> Vec<(u32, u32)> {
    let (b0, b1) = base;
    let (t0, t1) = target;
    if t1 < b0 || t0 > b1 {
        vec![base]
    } else if t0 <= b0 && t1 >= b1 {
        vec![]
    } else if t0 <= b0 {
        vec![(t1 + 1, b1)]
    } else if t1 >= b1 {
        vec![(b0, t0 - 1)]
    } else {
        vec![(b0, t0 - 1), (t1 + 1, b1)]
    }
}

/// `base` minus `target`, recursing over every alternative of both trees.
/// Returns `None` when the exclusion is exhaustive (spec.md §4.4:
/// `UnmatchablePattern`).
pub fn exclude(base: &CodePointTree, target: &CodePointTree) -> Option<CodePointTree> {
    let base_ranges = flatten_ranges(base);
    let target_ranges = flatten_ranges(target);
    let mut current = base_ranges;
    for &t in &target_ranges {
        current = current.into_iter().flat_map(|b| subtract_one(b, t)).collect();
        if current.is_empty() {
            return None;
        }
    }
    ranges_to_tree(&current)
}
