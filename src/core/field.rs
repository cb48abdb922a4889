// Field splitting and quote handling

use super::newlines::content_end;
use super::scanner::{Dialect, ParserState};
use std::borrow::Cow;

/// A field's raw byte span (quotes included) within the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBound {
    pub start: usize,
    pub end: usize,
}

/// Split the row starting at `start` into raw field spans.
///
/// `fields` is cleared and refilled so workers can reuse one buffer per task.
/// Returns the position one past the row terminator (or `data.len()`).
/// A comment ends the row's content; bytes up to the terminator are ignored.
pub fn split_fields(
    data: &[u8],
    start: usize,
    dialect: &Dialect,
    fields: &mut Vec<FieldBound>,
) -> usize {
    fields.clear();
    let mut state = ParserState::Unquoted;
    let mut field_start = start;
    let mut content_done = false;
    let mut pos = start;

    while pos < data.len() {
        let byte = data[pos];
        if dialect.ends_row(state, byte) {
            if !content_done {
                fields.push(FieldBound {
                    start: field_start,
                    end: content_end(data, field_start, pos, dialect.terminator),
                });
            }
            return pos + 1;
        }
        if !content_done && dialect.ends_field(state, byte) {
            fields.push(FieldBound {
                start: field_start,
                end: pos,
            });
            field_start = pos + 1;
        }
        state = dialect.transition(state, byte);
        if state == ParserState::Comment && !content_done {
            fields.push(FieldBound {
                start: field_start,
                end: pos,
            });
            content_done = true;
        }
        pos += 1;
    }

    if !content_done {
        fields.push(FieldBound {
            start: field_start,
            end: data.len(),
        });
    }
    data.len()
}

/// Field text with surrounding quotes stripped and doubled quotes collapsed.
///
/// Borrows from the input unless un-escaping forces a copy.
#[inline]
pub fn field_text<'a>(
    data: &'a [u8],
    bound: FieldBound,
    dialect: &Dialect,
    skip_initial_space: bool,
) -> Cow<'a, [u8]> {
    if bound.start >= bound.end {
        return Cow::Borrowed(&[]);
    }
    let mut field = &data[bound.start..bound.end];
    if skip_initial_space {
        while let [b' ', rest @ ..] = field {
            field = rest;
        }
    }
    unquote(field, dialect.quote, dialect.doublequote)
}

/// Strip one pair of surrounding quotes and un-escape doubled quotes.
#[inline]
pub fn unquote(field: &[u8], quote: u8, doublequote: bool) -> Cow<'_, [u8]> {
    // Not quoted - return as-is
    if field.len() < 2 || field[0] != quote || field[field.len() - 1] != quote {
        return Cow::Borrowed(field);
    }

    let inner = &field[1..field.len() - 1];

    // Fast path: no escaped quotes inside
    if !doublequote || !inner.contains(&quote) {
        return Cow::Borrowed(inner);
    }

    // Slow path: unescape doubled quote chars
    let mut result = Vec::with_capacity(inner.len());
    let mut i = 0;
    while i < inner.len() {
        if inner[i] == quote && i + 1 < inner.len() && inner[i + 1] == quote {
            result.push(quote);
            i += 2;
        } else {
            result.push(inner[i]);
            i += 1;
        }
    }
    Cow::Owned(result)
}
