//! Recursive-descent pattern parser (spec.md §4.4):
//!
//! ```text
//! alt    := concat ('|' concat)*
//! concat := repeat+
//! repeat := group ('*' | '+' | '?')?
//! group  := '(' alt ')' | single
//! single := '.' | bracket | code-point-expr | char-prop-expr
//!         | fragment-ref | literal-char
//! ```
//!
//! The teacher never parses a pattern itself (`lexan`/`alap_gen_ng` hand the
//! whole string to the `regex` crate), so this is grounded directly on
//! spec.md's grammar; control flow (explicit `Peekable<Chars>` cursor,
//! `Result<_, PatternError>` propagated with `?`) follows the teacher's
//! general recursive-descent style used in its own bootstrap parser.

use super::cpt::{exclude, CodePointTree, MAX_CODE_POINT};
use super::error::PatternError;
use super::oracle::{CharPropertyOracle, PropertyResolution};
use std::iter::Peekable;
use std::str::Chars;

pub struct Parser<'a, 'o> {
    chars: Peekable<Chars<'a>>,
    oracle: &'o dyn CharPropertyOracle,
    allow_contributory: bool,
}

pub fn parse(pattern: &str, oracle: &dyn CharPropertyOracle) -> Result<CodePointTree, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::NullPattern);
    }
    let mut parser = Parser {
        chars: pattern.chars().peekable(),
        oracle,
        allow_contributory: false,
    };
    let tree = parser.parse_alt()?;
    if parser.chars.peek().is_some() {
        return Err(PatternError::GroupNoInitiator);
    }
    Ok(tree)
}

impl<'a, 'o> Parser<'a, 'o> {
    fn parse_alt(&mut self) -> Result<CodePointTree, PatternError> {
        let mut tree = self.parse_concat()?;
        while self.peek_is('|') {
            self.chars.next();
            let rhs = self.parse_concat()?;
            tree = tree.alt(rhs);
        }
        Ok(tree)
    }

    fn parse_concat(&mut self) -> Result<CodePointTree, PatternError> {
        let mut tree = None;
        while let Some(&c) = self.chars.peek() {
            if c == '|' || c == ')' {
                break;
            }
            let next = self.parse_repeat()?;
            tree = Some(match tree {
                Some(t) => CodePointTree::concat(t, next),
                None => next,
            });
        }
        tree.ok_or(PatternError::AltLackOfOperand)
    }

    fn parse_repeat(&mut self) -> Result<CodePointTree, PatternError> {
        let target = self.parse_group()?;
        match self.chars.peek() {
            Some('*') => {
                self.chars.next();
                Ok(CodePointTree::Repeat(Box::new(target)))
            }
            Some('+') => {
                self.chars.next();
                Ok(target.one_or_more())
            }
            Some('?') => {
                self.chars.next();
                Ok(CodePointTree::Option(Box::new(target)))
            }
            _ => Ok(target),
        }
    }

    fn parse_group(&mut self) -> Result<CodePointTree, PatternError> {
        if self.peek_is('(') {
            self.chars.next();
            if self.peek_is(')') {
                return Err(PatternError::GroupNoElem);
            }
            let tree = self.parse_alt()?;
            if !self.peek_is(')') {
                return Err(PatternError::GroupUnclosed);
            }
            self.chars.next();
            Ok(tree)
        } else {
            self.parse_single()
        }
    }

    fn parse_single(&mut self) -> Result<CodePointTree, PatternError> {
        match self.chars.peek().copied() {
            None => Err(PatternError::RepNoTarget),
            Some(')') => Err(PatternError::GroupNoInitiator),
            Some('.') => {
                self.chars.next();
                Ok(CodePointTree::Range(0, MAX_CODE_POINT))
            }
            Some('[') => self.parse_bracket(),
            Some('\\') => self.parse_escape(false),
            Some(c) if c == '*' || c == '+' || c == '?' => Err(PatternError::RepNoTarget),
            Some(c) => {
                self.chars.next();
                let cp = c as u32;
                Ok(CodePointTree::Range(cp, cp))
            }
        }
    }

    /// `in_bracket` disallows `\f{...}`: spec.md §4.4 forbids a fragment
    /// reference inside a bracket expression.
    fn parse_escape(&mut self, in_bracket: bool) -> Result<CodePointTree, PatternError> {
        self.chars.next(); // consume '\'
        match self.chars.peek().copied() {
            None => Err(PatternError::IncompletedEscSeq),
            Some('u') => {
                self.chars.next();
                let cp = self.parse_braced_hex(PatternError::CPExpInvalidForm)?;
                if cp > MAX_CODE_POINT {
                    return Err(PatternError::CPExpOutOfRange);
                }
                Ok(CodePointTree::Range(cp, cp))
            }
            Some('p') => {
                self.chars.next();
                self.parse_char_prop_expr()
            }
            Some('f') if in_bracket => Err(PatternError::BExpInvalidForm),
            Some('f') => {
                self.chars.next();
                self.parse_fragment_ref()
            }
            Some('n') => {
                self.chars.next();
                Ok(CodePointTree::Range('\n' as u32, '\n' as u32))
            }
            Some('t') => {
                self.chars.next();
                Ok(CodePointTree::Range('\t' as u32, '\t' as u32))
            }
            Some('r') => {
                self.chars.next();
                Ok(CodePointTree::Range('\r' as u32, '\r' as u32))
            }
            Some(c) if "|*+?.()[]\\^-".contains(c) => {
                self.chars.next();
                let cp = c as u32;
                Ok(CodePointTree::Range(cp, cp))
            }
            Some(c) => Err(PatternError::InvalidEscSeq(c)),
        }
    }

    fn parse_braced_hex(&mut self, invalid: PatternError) -> Result<u32, PatternError> {
        if !self.peek_is('{') {
            return Err(invalid);
        }
        self.chars.next();
        let mut digits = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '}' {
                break;
            }
            digits.push(c);
            self.chars.next();
        }
        if !self.peek_is('}') {
            return Err(invalid.clone());
        }
        self.chars.next();
        if digits.len() != 4 && digits.len() != 6 {
            return Err(invalid);
        }
        u32::from_str_radix(&digits, 16).map_err(|_| invalid)
    }

    fn parse_name_value(&mut self) -> Result<(String, Option<String>), PatternError> {
        if !self.peek_is('{') {
            return Err(PatternError::CharPropExpInvalidForm);
        }
        self.chars.next();
        let mut body = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '}' {
                break;
            }
            body.push(c);
            self.chars.next();
        }
        if !self.peek_is('}') {
            return Err(PatternError::CharPropExpInvalidForm);
        }
        self.chars.next();
        if body.is_empty() {
            return Err(PatternError::CharPropExpInvalidForm);
        }
        match body.split_once('=') {
            Some((name, value)) => Ok((name.to_string(), Some(value.to_string()))),
            None => Ok((body, None)),
        }
    }

    fn parse_char_prop_expr(&mut self) -> Result<CodePointTree, PatternError> {
        let (name, value) = self.parse_name_value()?;
        if !self.allow_contributory && self.oracle.is_contributory(&name) {
            return Err(PatternError::CharPropExpUnsupported(name));
        }
        match self.oracle.normalize(&name, value.as_deref()) {
            None => Err(PatternError::CharPropExpUnsupported(name)),
            Some(PropertyResolution::Ranges { ranges, inverse }) => {
                let tree = super::cpt::ranges_to_tree(&ranges).ok_or(PatternError::UnmatchablePattern)?;
                if inverse {
                    let full = CodePointTree::Range(0, MAX_CODE_POINT);
                    exclude(&full, &tree).ok_or(PatternError::UnmatchablePattern)
                } else {
                    Ok(tree)
                }
            }
            Some(PropertyResolution::Pattern(sub_pattern)) => {
                let mut sub = Parser {
                    chars: sub_pattern.chars().peekable(),
                    oracle: self.oracle,
                    allow_contributory: true,
                };
                let tree = sub.parse_alt()?;
                if sub.chars.peek().is_some() {
                    return Err(PatternError::CharPropExpInvalidForm);
                }
                Ok(tree)
            }
        }
    }

    fn parse_fragment_ref(&mut self) -> Result<CodePointTree, PatternError> {
        if !self.peek_is('{') {
            return Err(PatternError::FragmentExpInvalidForm);
        }
        self.chars.next();
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c == '}' {
                break;
            }
            name.push(c);
            self.chars.next();
        }
        if !self.peek_is('}') || name.is_empty() {
            return Err(PatternError::FragmentExpInvalidForm);
        }
        self.chars.next();
        Ok(CodePointTree::Fragment(name, None))
    }

    fn parse_bracket(&mut self) -> Result<CodePointTree, PatternError> {
        self.chars.next(); // consume '['
        let inverse = self.peek_is('^');
        if inverse {
            self.chars.next();
        }
        if self.peek_is(']') {
            return Err(PatternError::BExpNoElem);
        }
        let mut tree: Option<CodePointTree> = None;
        while let Some(&c) = self.chars.peek() {
            if c == ']' {
                break;
            }
            let item = self.parse_bracket_item()?;
            tree = Some(match tree {
                Some(t) => t.alt(item),
                None => item,
            });
        }
        if !self.peek_is(']') {
            return Err(PatternError::BExpUnclosed);
        }
        self.chars.next();
        let tree = tree.ok_or(PatternError::BExpNoElem)?;
        if inverse {
            let full = CodePointTree::Range(0, MAX_CODE_POINT);
            exclude(&full, &tree).ok_or(PatternError::UnmatchablePattern)
        } else {
            Ok(tree)
        }
    }

    fn parse_bracket_item(&mut self) -> Result<CodePointTree, PatternError> {
        if self.peek_is('\\') {
            let head = self.parse_escape(true)?;
            return self.maybe_extend_range(head);
        }
        let c = self.chars.next().ok_or(PatternError::BExpInvalidForm)?;
        let head = CodePointTree::Range(c as u32, c as u32);
        self.maybe_extend_range(head)
    }

    /// After a single code point inside a bracket expression, checks for a
    /// `-high` suffix to form a range; rejects a range whose low endpoint
    /// came from a character property (spec.md §4.4: `RangePropIsUnavailable`).
    fn maybe_extend_range(&mut self, head: CodePointTree) -> Result<CodePointTree, PatternError> {
        if !self.peek_is('-') {
            return Ok(head);
        }
        let low = match head {
            CodePointTree::Range(a, b) if a == b => a,
            _ => return Err(PatternError::RangePropIsUnavailable),
        };
        self.chars.next(); // consume '-'
        let high_tree = if self.peek_is('\\') {
            self.parse_escape(true)?
        } else {
            let c = self.chars.next().ok_or(PatternError::RangeInvalidForm)?;
            CodePointTree::Range(c as u32, c as u32)
        };
        let high = match high_tree {
            CodePointTree::Range(a, b) if a == b => a,
            _ => return Err(PatternError::RangePropIsUnavailable),
        };
        if high < low {
            return Err(PatternError::RangeInvalidOrder);
        }
        Ok(CodePointTree::Range(low, high))
    }

    fn peek_is(&mut self, c: char) -> bool {
        self.chars.peek() == Some(&c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::cpt::flatten_ranges;

    struct NoOracle;
    impl CharPropertyOracle for NoOracle {
        fn normalize(&self, _name: &str, _value: Option<&str>) -> Option<PropertyResolution> {
            None
        }
        fn is_contributory(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn literal_concat_builds_sequential_ranges() {
        let tree = parse("ab", &NoOracle).unwrap();
        match tree {
            CodePointTree::Concat(l, r) => {
                assert_eq!(*l, CodePointTree::Range('a' as u32, 'a' as u32));
                assert_eq!(*r, CodePointTree::Range('b' as u32, 'b' as u32));
            }
            other => panic!("expected Concat, got {:?}", other),
        }
    }

    #[test]
    fn bracket_range_parses_low_to_high() {
        let tree = parse("[a-z]", &NoOracle).unwrap();
        assert_eq!(flatten_ranges(&tree), vec![('a' as u32, 'z' as u32)]);
    }

    #[test]
    fn inverse_single_char_matches_cpt_exclusion() {
        let tree = parse("[^c]", &NoOracle).unwrap();
        let c = 'c' as u32;
        assert_eq!(flatten_ranges(&tree), vec![(0, c - 1), (c + 1, MAX_CODE_POINT)]);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert_eq!(parse("", &NoOracle), Err(PatternError::NullPattern));
    }

    #[test]
    fn unclosed_group_is_rejected() {
        assert_eq!(parse("(a", &NoOracle), Err(PatternError::GroupUnclosed));
    }

    #[test]
    fn descending_range_is_rejected() {
        assert_eq!(parse("[z-a]", &NoOracle), Err(PatternError::RangeInvalidOrder));
    }

    #[test]
    fn alternation_and_repetition_compose() {
        let tree = parse("a|b*", &NoOracle).unwrap();
        match tree {
            CodePointTree::Alt(_, r) => match *r {
                CodePointTree::Repeat(_) => {}
                other => panic!("expected Repeat, got {:?}", other),
            },
            other => panic!("expected Alt, got {:?}", other),
        }
    }

    #[test]
    fn fragment_ref_inside_bracket_is_rejected() {
        assert_eq!(parse("[\\f{x}]", &NoOracle), Err(PatternError::BExpInvalidForm));
        assert_eq!(parse("[^\\f{x}]", &NoOracle), Err(PatternError::BExpInvalidForm));
    }

    #[test]
    fn code_point_escape_requires_four_or_six_hex_digits() {
        assert_eq!(parse("\\u{1}", &NoOracle), Err(PatternError::CPExpInvalidForm));
        assert_eq!(parse("\\u{00041}", &NoOracle), Err(PatternError::CPExpInvalidForm));
        assert_eq!(parse("\\u{0000041}", &NoOracle), Err(PatternError::CPExpInvalidForm));
        assert!(parse("\\u{0041}", &NoOracle).is_ok());
        assert!(parse("\\u{10FFFF}", &NoOracle).is_ok());
    }

    #[test]
    fn leading_repetition_operator_has_no_target() {
        assert_eq!(parse("*a", &NoOracle), Err(PatternError::RepNoTarget));
        assert_eq!(parse("+a", &NoOracle), Err(PatternError::RepNoTarget));
        assert_eq!(parse("?a", &NoOracle), Err(PatternError::RepNoTarget));
    }
}
