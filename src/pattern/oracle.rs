//! The two external collaborators the pattern parser calls into but does
//! not implement (spec.md §1, §6): a Unicode character-property oracle and
//! the UTF-8 byte-range helper used later by the byte tree (spec.md §4.5).
//! The teacher has no analogue (it never inspects code points, just hands
//! whole pattern strings to the `regex` crate), so these traits are shaped
//! directly from spec.md §6's two operations.

/// Result of normalizing a `\p{name}` / `\p{name=value}` character property:
/// either a pattern string to re-parse (contributory properties are allowed
/// during that re-parse even though they are rejected at the top level), or
/// a resolved list of code-point ranges with an inversion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyResolution {
    Pattern(String),
    Ranges { ranges: Vec<(u32, u32)>, inverse: bool },
}

pub trait CharPropertyOracle {
    fn normalize(&self, name: &str, value: Option<&str>) -> Option<PropertyResolution>;
    fn is_contributory(&self, name: &str) -> bool;
}

/// `generate_char_blocks(from, to)` returns, for a code-point range, one
/// `(from_bytes, to_bytes)` pair per UTF-8 byte-length class the range
/// spans (spec.md §4.5, §6).
pub trait ByteRangeHelper {
    fn generate_char_blocks(&self, from: u32, to: u32) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// A minimal, dependency-free `ByteRangeHelper` good enough to drive the DFA
/// builder and its tests without an external Unicode database: it encodes
/// the endpoints with the standard UTF-8 algorithm and, when `from` and `to`
/// fall in different byte-length classes, splits at each class boundary so
/// every sub-range shares one encoded length (spec.md §4.5's
/// "one per byte-length class").
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardByteRangeHelper;

const CLASS_BOUNDARIES: [u32; 4] = [0x7F, 0x7FF, 0xFFFF, 0x10FFFF];

impl ByteRangeHelper for StandardByteRangeHelper {
    fn generate_char_blocks(&self, from: u32, to: u32) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut blocks = Vec::new();
        let mut lo = from;
        for &boundary in &CLASS_BOUNDARIES {
            if lo > to {
                break;
            }
            if lo > boundary {
                continue;
            }
            let hi = to.min(boundary);
            blocks.push((encode_utf8(lo), encode_utf8(hi)));
            lo = boundary + 1;
        }
        blocks
    }
}

fn encode_utf8(code_point: u32) -> Vec<u8> {
    let c = char::from_u32(code_point).unwrap_or('\u{FFFD}');
    let mut buf = [0u8; 4];
    c.encode_utf8(&mut buf).as_bytes().to_vec()
}
