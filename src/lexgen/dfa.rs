//! Subset construction and table emission (spec.md §4.5 "Subset
//! construction", "Emission"). New code, grounded directly on spec.md: no
//! corpus repo builds its own DFA (the teacher hands patterns to the
//! `regex` crate at match time instead).

use super::augment::{Augmented, Position};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Dense state machine: `transition[0]` is the reserved nil row (every byte
/// leads to state 0, never accepting); real states start at `initial`'s
/// configured minimum (spec.md §4.5 "Emission", default 1).
#[derive(Debug)]
pub struct Dfa {
    pub initial: u32,
    pub state_count: u32,
    pub accepting: Vec<Option<u32>>,
    pub transition: Vec<[u32; 256]>,
}

impl Dfa {
    pub fn is_accepting(&self, state: u32) -> Option<u32> {
        self.accepting.get(state as usize).copied().flatten()
    }

    pub fn step(&self, state: u32, byte: u8) -> u32 {
        self.transition
            .get(state as usize)
            .map(|row| row[byte as usize])
            .unwrap_or(0)
    }

    /// Runs the DFA over a whole byte string, reporting the lowest-kind-id
    /// accepting state reached at the end, if any (used by tests to check
    /// DFA/CPT equivalence, spec.md §8).
    pub fn accepts(&self, input: &[u8]) -> Option<u32> {
        let mut state = self.initial;
        for &byte in input {
            state = self.step(state, byte);
            if state == 0 {
                return None;
            }
        }
        self.is_accepting(state)
    }
}

/// `min_state_id` is the first id assigned to a real state (spec.md §4.5:
/// "configured minimum, 1 by default; 0 reserved for nil").
pub fn build_dfa(augmented: &Augmented, min_state_id: u32) -> Dfa {
    let byte_positions: Vec<(u32, u8, u8)> = augmented
        .positions
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match p {
            Position::Byte(lo, hi) => Some((i as u32 + 1, *lo, *hi)),
            Position::EndMarker(_) => None,
        })
        .collect();
    let end_marker_kind: BTreeMap<u32, u32> = augmented
        .positions
        .iter()
        .enumerate()
        .filter_map(|(i, p)| match p {
            Position::EndMarker(kind) => Some((i as u32 + 1, *kind)),
            Position::Byte(_, _) => None,
        })
        .collect();

    let mut state_ids: BTreeMap<BTreeSet<u32>, u32> = BTreeMap::new();
    let mut queue: VecDeque<BTreeSet<u32>> = VecDeque::new();
    let mut next_id = min_state_id;

    let initial = augmented.root_firstpos.clone();
    state_ids.insert(initial.clone(), next_id);
    queue.push_back(initial.clone());
    let initial_id = next_id;
    next_id += 1;

    let mut rows: BTreeMap<u32, [u32; 256]> = BTreeMap::new();
    let mut accepting: BTreeMap<u32, Option<u32>> = BTreeMap::new();

    while let Some(set) = queue.pop_front() {
        let sid = state_ids[&set];
        accepting.insert(
            sid,
            set.iter().filter_map(|p| end_marker_kind.get(p).copied()).min(),
        );

        let mut row = [0u32; 256];
        for value in 0u16..256 {
            let byte = value as u8;
            let mut union = BTreeSet::new();
            for &(pos, lo, hi) in &byte_positions {
                if set.contains(&pos) && lo <= byte && byte <= hi {
                    if let Some(follow) = augmented.followpos.get(&pos) {
                        union.extend(follow.iter().copied());
                    }
                }
            }
            if union.is_empty() {
                continue;
            }
            let target = *state_ids.entry(union.clone()).or_insert_with(|| {
                let id = next_id;
                next_id += 1;
                queue.push_back(union.clone());
                id
            });
            row[value as usize] = target;
        }
        rows.insert(sid, row);
    }

    let state_count = next_id - min_state_id;
    let mut transition = vec![[0u32; 256]; (state_count + min_state_id) as usize];
    let mut accepting_vec = vec![None; (state_count + min_state_id) as usize];
    for (sid, row) in rows {
        transition[sid as usize] = row;
        accepting_vec[sid as usize] = accepting[&sid];
    }

    Dfa {
        initial: initial_id,
        state_count,
        accepting: accepting_vec,
        transition,
    }
}

#[cfg(test)]
mod tests {
    use super::super::augment::augment;
    use super::super::byte_tree::ByteTree;
    use super::*;

    #[test]
    fn single_literal_accepts_only_itself() {
        // "a" with end marker kind 7.
        let tree = ByteTree::Concat(
            Box::new(ByteTree::Range(b'a', b'a')),
            Box::new(ByteTree::EndMarker(7)),
        );
        let augmented = augment(&tree);
        let dfa = build_dfa(&augmented, 1);
        assert_eq!(dfa.accepts(b"a"), Some(7));
        assert_eq!(dfa.accepts(b"b"), None);
        assert_eq!(dfa.accepts(b"aa"), None);
    }

    #[test]
    fn star_repeats_accept_any_length() {
        // "a*" with end marker kind 1: "", "a", "aaa" all accept.
        let tree = ByteTree::Alt(
            Box::new(ByteTree::EndMarker(1)),
            Box::new(ByteTree::Concat(
                Box::new(ByteTree::Range(b'a', b'a')),
                Box::new(ByteTree::Concat(
                    Box::new(ByteTree::Repeat(Box::new(ByteTree::Range(b'a', b'a')))),
                    Box::new(ByteTree::EndMarker(1)),
                )),
            )),
        );
        let augmented = augment(&tree);
        let dfa = build_dfa(&augmented, 1);
        assert_eq!(dfa.accepts(b""), Some(1));
        assert_eq!(dfa.accepts(b"a"), Some(1));
        assert_eq!(dfa.accepts(b"aaaa"), Some(1));
        assert_eq!(dfa.accepts(b"b"), None);
    }

    #[test]
    fn lowest_kind_id_wins_acceptance_tie() {
        // two kinds both matching "a" — kind 1 must win over kind 2.
        let tree = ByteTree::Alt(
            Box::new(ByteTree::Concat(
                Box::new(ByteTree::Range(b'a', b'a')),
                Box::new(ByteTree::EndMarker(1)),
            )),
            Box::new(ByteTree::Concat(
                Box::new(ByteTree::Range(b'a', b'a')),
                Box::new(ByteTree::EndMarker(2)),
            )),
        );
        let augmented = augment(&tree);
        let dfa = build_dfa(&augmented, 1);
        assert_eq!(dfa.accepts(b"a"), Some(1));
    }
}
