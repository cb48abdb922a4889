// Error type for the whole read pipeline
//
// Every stage reports through CsvError. There is no partial success: the
// first error raised by any stage aborts the read.

use thiserror::Error;

use crate::column::DataType;

#[derive(Error, Debug)]
pub enum CsvError {
    /// Requested byte or row window does not fit the data.
    #[error("input bounds: {0}")]
    InputBounds(String),

    /// Strict mode found a row whose field count differs from the column count.
    #[error("malformed row {row}: expected {expected} fields, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A cell could not be converted to its column's type.
    #[error("cannot convert {value:?} in row {row}, column {column:?} to {dtype}")]
    TypeConversion {
        row: usize,
        column: String,
        dtype: DataType,
        value: String,
    },

    /// Reserving an intermediate or output buffer failed.
    #[error("failed to allocate {requested} elements for {what}")]
    ResourceExhausted { what: &'static str, requested: usize },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("options decode failed: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CsvError>;

/// Allocate a vector of exactly `len` copies of `value`, surfacing
/// allocation failure instead of aborting.
pub(crate) fn try_alloc<T: Clone>(what: &'static str, len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| CsvError::ResourceExhausted {
            what,
            requested: len,
        })?;
    v.resize(len, value);
    Ok(v)
}
