// Immutable per-read parse context
//
// Built once from ReaderOptions and passed by reference to every stage.

use super::numeric::NumberFormat;
use super::scanner::Dialect;
use super::trie::SerialTrie;
use crate::error::{CsvError, Result};
use crate::options::{ConversionErrorPolicy, ReaderOptions};

#[derive(Debug, Clone)]
pub struct ParseContext {
    pub dialect: Dialect,
    pub na_trie: SerialTrie,
    pub true_trie: SerialTrie,
    pub false_trie: SerialTrie,
    pub number: NumberFormat,
    pub dayfirst: bool,
    pub infer_dates: bool,
    pub skip_initial_space: bool,
    pub skip_blank_lines: bool,
    pub strict: bool,
    pub on_conversion_error: ConversionErrorPolicy,
    pub chunk_size: usize,
}

impl ParseContext {
    pub fn new(opts: &ReaderOptions) -> Result<Self> {
        validate(opts)?;
        Ok(ParseContext {
            dialect: Dialect {
                delimiter: opts.delimiter,
                quote: opts.quote,
                doublequote: opts.doublequote,
                comment: opts.comment,
                terminator: opts.line_terminator,
            },
            na_trie: SerialTrie::new(opts.null_tokens()),
            true_trie: SerialTrie::new(&opts.true_values),
            false_trie: SerialTrie::new(&opts.false_values),
            number: NumberFormat {
                decimal: opts.decimal,
                thousands: opts.thousands,
            },
            dayfirst: opts.dayfirst,
            infer_dates: opts.infer_dates,
            skip_initial_space: opts.skip_initial_space,
            skip_blank_lines: opts.skip_blank_lines,
            strict: opts.strict,
            on_conversion_error: opts.on_conversion_error,
            chunk_size: opts.chunk_size,
        })
    }

    #[inline]
    pub fn is_null(&self, text: &[u8]) -> bool {
        self.na_trie.contains(text)
    }

    /// `Some(true|false)` when `text` is a boolean token.
    #[inline]
    pub fn bool_token(&self, text: &[u8]) -> Option<bool> {
        if self.true_trie.contains(text) {
            Some(true)
        } else if self.false_trie.contains(text) {
            Some(false)
        } else {
            None
        }
    }
}

fn validate(opts: &ReaderOptions) -> Result<()> {
    if opts.chunk_size == 0 {
        return Err(CsvError::InvalidOption("chunk_size must be at least 1".into()));
    }
    let mut structural = vec![
        ("delimiter", opts.delimiter),
        ("quote", opts.quote),
        ("line_terminator", opts.line_terminator),
    ];
    if let Some(c) = opts.comment {
        structural.push(("comment", c));
    }
    for (i, (a, x)) in structural.iter().enumerate() {
        for (b, y) in &structural[i + 1..] {
            if x == y {
                return Err(CsvError::InvalidOption(format!(
                    "{} and {} are both {:?}",
                    a, b, *x as char
                )));
            }
        }
    }
    if opts.decimal == opts.delimiter {
        return Err(CsvError::InvalidOption(
            "decimal must differ from delimiter".into(),
        ));
    }
    if opts.thousands == Some(opts.decimal) {
        return Err(CsvError::InvalidOption(
            "thousands must differ from decimal".into(),
        ));
    }
    Ok(())
}
