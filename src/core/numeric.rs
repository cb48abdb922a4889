// Numeric literal lexing
//
// Grammar checks are separate from value parsing so the inferencer can
// classify a field without producing a value. Surrounding ASCII whitespace
// is ignored by everything here.

/// Locale bytes for numeric literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimal: u8,
    pub thousands: Option<u8>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat {
            decimal: b'.',
            thousands: None,
        }
    }
}

#[inline]
fn strip_sign(text: &[u8]) -> (bool, &[u8]) {
    match text.first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// Length of the digit run at the start of `text`, allowing thousands
/// separators strictly between digits. Returns (bytes consumed, digit count).
#[inline]
fn digit_run(text: &[u8], thousands: Option<u8>) -> (usize, usize) {
    let mut i = 0;
    let mut digits = 0;
    while i < text.len() {
        let b = text[i];
        if b.is_ascii_digit() {
            digits += 1;
            i += 1;
        } else if Some(b) == thousands
            && digits > 0
            && text.get(i + 1).is_some_and(|n| n.is_ascii_digit())
        {
            i += 1;
        } else {
            break;
        }
    }
    (i, digits)
}

/// Optional sign followed by digits only.
pub fn is_integer(text: &[u8], fmt: &NumberFormat) -> bool {
    let (_, body) = strip_sign(text.trim_ascii());
    let (used, digits) = digit_run(body, fmt.thousands);
    digits > 0 && used == body.len()
}

/// Digits with at most one decimal point and an optional exponent.
pub fn is_float(text: &[u8], fmt: &NumberFormat) -> bool {
    let (_, body) = strip_sign(text.trim_ascii());
    let (mut i, mut digits) = digit_run(body, fmt.thousands);
    if body.get(i) == Some(&fmt.decimal) {
        let (used, frac) = digit_run(&body[i + 1..], None);
        i += 1 + used;
        digits += frac;
    }
    if digits == 0 {
        return false;
    }
    if matches!(body.get(i), Some(b'e') | Some(b'E')) {
        let (_, exp) = strip_sign(&body[i + 1..]);
        let (used, exp_digits) = digit_run(exp, None);
        return exp_digits > 0 && used == exp.len();
    }
    i == body.len()
}

/// Parse an integer literal; `None` on bad grammar or i64 overflow.
pub fn parse_i64(text: &[u8], fmt: &NumberFormat) -> Option<i64> {
    if !is_integer(text, fmt) {
        return None;
    }
    let (negative, body) = strip_sign(text.trim_ascii());
    let mut value: i64 = 0;
    for &b in body {
        if !b.is_ascii_digit() {
            continue;
        }
        let d = (b - b'0') as i64;
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(d)?
        } else {
            value.checked_add(d)?
        };
    }
    Some(value)
}

/// Parse a float literal (integers included).
pub fn parse_f64(text: &[u8], fmt: &NumberFormat) -> Option<f64> {
    if !is_float(text, fmt) {
        return None;
    }
    let text = text.trim_ascii();
    let mut normalized = String::with_capacity(text.len());
    for &b in text {
        if Some(b) == fmt.thousands {
            continue;
        }
        normalized.push(if b == fmt.decimal { '.' } else { b as char });
    }
    normalized.parse().ok()
}
