// Row terminator handling
//
// The automaton only knows a single terminator byte. When that byte is `\n`
// a `\r` right before it belongs to the terminator, not to the row content.
// A bare `\r` anywhere else is data.

use super::scanner::Dialect;

/// End of row content for a terminator found at `term_pos`.
#[inline]
pub fn content_end(data: &[u8], row_start: usize, term_pos: usize, terminator: u8) -> usize {
    if terminator == b'\n' && term_pos > row_start && data[term_pos - 1] == b'\r' {
        term_pos - 1
    } else {
        term_pos
    }
}

/// Whether the row starting at `start` has no content: an empty line, or a
/// line that opens with the comment character.
#[inline]
pub fn is_blank_row(data: &[u8], start: usize, dialect: &Dialect) -> bool {
    match data.get(start) {
        None => true,
        Some(&b) if b == dialect.terminator => true,
        Some(&b) if Some(b) == dialect.comment => true,
        Some(&b'\r') => dialect.terminator == b'\n' && data.get(start + 1) == Some(&b'\n'),
        Some(_) => false,
    }
}
