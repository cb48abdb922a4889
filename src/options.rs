// Reader options
//
// Plain data, built once by the caller and never mutated by the pipeline.
// ParseContext::new validates it and derives the per-read tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::column::DataType;
use crate::error::Result;

/// Default bytes per scanned chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Strings treated as null when `keep_default_na` is set.
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "n/a", "nan", "null",
];

/// What to do with a cell whose text does not parse as its column type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversionErrorPolicy {
    /// Abort the whole read with `CsvError::TypeConversion`.
    #[default]
    Fail,
    /// Store a null in that cell and keep going.
    Null,
}

/// Reference to a column by position or by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl From<usize> for ColumnRef {
    fn from(i: usize) -> Self {
        ColumnRef::Index(i)
    }
}

impl From<&str> for ColumnRef {
    fn from(s: &str) -> Self {
        ColumnRef::Name(s.to_string())
    }
}

/// Caller-pinned column types.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Dtypes {
    /// One type per column, in column order.
    Positional(Vec<DataType>),
    /// Types for the named columns only.
    Named(BTreeMap<String, DataType>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReaderOptions {
    pub delimiter: u8,
    pub quote: u8,
    /// Two consecutive quotes inside a quoted field are a literal quote.
    pub doublequote: bool,
    pub comment: Option<u8>,
    /// Row terminator byte. A `\r` right before it is not part of the row.
    pub line_terminator: u8,
    /// Row index (after `skip_rows`) holding column names; `None` for no header.
    pub header: Option<usize>,
    pub names: Option<Vec<String>>,
    /// Prefix for generated column names when there is no header.
    pub prefix: String,
    pub mangle_dupe_cols: bool,
    pub use_cols: Option<Vec<ColumnRef>>,
    pub dtypes: Option<Dtypes>,
    pub parse_dates: Vec<ColumnRef>,
    pub true_values: Vec<String>,
    pub false_values: Vec<String>,
    pub na_values: Vec<String>,
    pub keep_default_na: bool,
    pub na_filter: bool,
    pub infer_dates: bool,
    pub dayfirst: bool,
    pub decimal: u8,
    pub thousands: Option<u8>,
    pub skip_initial_space: bool,
    pub skip_blank_lines: bool,
    /// Reject rows whose field count differs from the column count.
    pub strict: bool,
    pub on_conversion_error: ConversionErrorPolicy,
    pub chunk_size: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            delimiter: b',',
            quote: b'"',
            doublequote: true,
            comment: None,
            line_terminator: b'\n',
            header: Some(0),
            names: None,
            prefix: String::new(),
            mangle_dupe_cols: true,
            use_cols: None,
            dtypes: None,
            parse_dates: Vec::new(),
            true_values: vec!["True".into(), "TRUE".into(), "true".into()],
            false_values: vec!["False".into(), "FALSE".into(), "false".into()],
            na_values: Vec::new(),
            keep_default_na: true,
            na_filter: true,
            infer_dates: false,
            dayfirst: false,
            decimal: b'.',
            thousands: None,
            skip_initial_space: false,
            skip_blank_lines: true,
            strict: false,
            on_conversion_error: ConversionErrorPolicy::Fail,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ReaderOptions {
    /// Load options from JSON; absent keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The effective null token list.
    pub fn null_tokens(&self) -> Vec<&str> {
        if !self.na_filter {
            return Vec::new();
        }
        let mut tokens: Vec<&str> = self.na_values.iter().map(String::as_str).collect();
        if self.keep_default_na {
            tokens.extend_from_slice(DEFAULT_NA_VALUES);
        }
        tokens
    }
}

/// Which rows of the resolved data to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadWindow {
    /// First byte of the range; rows must start at or after it.
    pub range_offset: usize,
    /// Range length in bytes; 0 reads to the end of the data.
    pub range_size: usize,
    pub skip_rows: usize,
    pub skip_rows_end: usize,
    /// Upper bound on returned rows; `None` for all.
    pub num_rows: Option<usize>,
}

impl ReadWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn byte_range(offset: usize, size: usize) -> Self {
        ReadWindow {
            range_offset: offset,
            range_size: size,
            ..Self::default()
        }
    }
}
