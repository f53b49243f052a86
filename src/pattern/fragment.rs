//! Fragment completion (spec.md §4.4): a named fragment's pattern may
//! reference other fragments by name; before a pattern tree can be handed to
//! the lexical compiler every `Fragment` node must be replaced by its
//! definition, in dependency order, with cycles and undefined names rejected.
//!
//! No teacher module has fragments (the teacher's `lexan` has no nested
//! pattern concept at all), so this is new, grounded on spec.md's own
//! description of the procedure; the fixed-point-over-a-dependency-graph
//! shape mirrors `first_follow.rs`'s style in this crate.

use super::cpt::CodePointTree;
use super::error::PatternError;
use std::collections::{BTreeMap, BTreeSet};

/// Replaces every `Fragment` reference in `tree` with its definition from
/// `definitions`, recursing until no fragment nodes remain. `visiting` tracks
/// the names on the current expansion path to detect cycles.
fn substitute(
    tree: &CodePointTree,
    definitions: &BTreeMap<String, CodePointTree>,
    visiting: &mut BTreeSet<String>,
) -> Result<CodePointTree, PatternError> {
    match tree {
        CodePointTree::Fragment(name, _) => {
            if !visiting.insert(name.clone()) {
                return Err(PatternError::CyclicFragment(name.clone()));
            }
            let definition = definitions
                .get(name)
                .ok_or_else(|| PatternError::UndefinedFragment(name.clone()))?;
            let expanded = substitute(definition, definitions, visiting)?;
            visiting.remove(name);
            Ok(expanded)
        }
        CodePointTree::Range(a, b) => Ok(CodePointTree::Range(*a, *b)),
        CodePointTree::Concat(l, r) => Ok(CodePointTree::Concat(
            Box::new(substitute(l, definitions, visiting)?),
            Box::new(substitute(r, definitions, visiting)?),
        )),
        CodePointTree::Alt(l, r) => Ok(CodePointTree::Alt(
            Box::new(substitute(l, definitions, visiting)?),
            Box::new(substitute(r, definitions, visiting)?),
        )),
        CodePointTree::Repeat(inner) => {
            Ok(CodePointTree::Repeat(Box::new(substitute(inner, definitions, visiting)?)))
        }
        CodePointTree::Option(inner) => {
            Ok(CodePointTree::Option(Box::new(substitute(inner, definitions, visiting)?)))
        }
        CodePointTree::Root { kind, child } => Ok(CodePointTree::Root {
            kind: *kind,
            child: Box::new(substitute(child, definitions, visiting)?),
        }),
    }
}

/// Fully expands every fragment reference in every definition, then in every
/// pattern that uses them. Definitions are completed first so a later
/// pattern's expansion never re-walks the same fragment body twice.
pub fn complete_fragments(
    fragment_patterns: &BTreeMap<String, CodePointTree>,
    patterns: &[CodePointTree],
) -> Result<(BTreeMap<String, CodePointTree>, Vec<CodePointTree>), PatternError> {
    let mut completed = BTreeMap::new();
    for name in fragment_patterns.keys() {
        let mut visiting = BTreeSet::new();
        let expanded = substitute(&fragment_patterns[name], fragment_patterns, &mut visiting)?;
        completed.insert(name.clone(), expanded);
    }
    let mut result = Vec::with_capacity(patterns.len());
    for tree in patterns {
        let mut visiting = BTreeSet::new();
        result.push(substitute(tree, fragment_patterns, &mut visiting)?);
    }
    Ok((completed, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_reference_is_replaced_by_its_definition() {
        let mut fragments = BTreeMap::new();
        fragments.insert("digit".to_string(), CodePointTree::Range('0' as u32, '9' as u32));
        let pattern = CodePointTree::Fragment("digit".to_string(), None);
        let (_, patterns) = complete_fragments(&fragments, &[pattern]).unwrap();
        assert_eq!(patterns[0], CodePointTree::Range('0' as u32, '9' as u32));
    }

    #[test]
    fn nested_fragment_references_are_fully_expanded() {
        let mut fragments = BTreeMap::new();
        fragments.insert("digit".to_string(), CodePointTree::Range('0' as u32, '9' as u32));
        fragments.insert(
            "digits".to_string(),
            CodePointTree::Fragment("digit".to_string(), None).one_or_more(),
        );
        let pattern = CodePointTree::Fragment("digits".to_string(), None);
        let (_, patterns) = complete_fragments(&fragments, &[pattern]).unwrap();
        match &patterns[0] {
            CodePointTree::Concat(l, r) => {
                assert_eq!(**l, CodePointTree::Range('0' as u32, '9' as u32));
                match &**r {
                    CodePointTree::Repeat(inner) => {
                        assert_eq!(**inner, CodePointTree::Range('0' as u32, '9' as u32))
                    }
                    other => panic!("expected Repeat, got {:?}", other),
                }
            }
            other => panic!("expected Concat, got {:?}", other),
        }
    }

    #[test]
    fn undefined_fragment_is_rejected() {
        let fragments = BTreeMap::new();
        let pattern = CodePointTree::Fragment("missing".to_string(), None);
        assert_eq!(
            complete_fragments(&fragments, &[pattern]),
            Err(PatternError::UndefinedFragment("missing".to_string()))
        );
    }

    #[test]
    fn cyclic_fragment_is_rejected() {
        let mut fragments = BTreeMap::new();
        fragments.insert("a".to_string(), CodePointTree::Fragment("b".to_string(), None));
        fragments.insert("b".to_string(), CodePointTree::Fragment("a".to_string(), None));
        let pattern = CodePointTree::Fragment("a".to_string(), None);
        let result = complete_fragments(&fragments, &[pattern]);
        assert!(matches!(result, Err(PatternError::CyclicFragment(_))));
    }
}
