// Stage 3: column type inference
//
// Every field yields a bitmask of the types it is compatible with. Masks are
// AND-ed per column in a rayon fold/reduce, so evaluation order never changes
// the result. Nulls yield the all-ones mask and leave a column untouched.

use rayon::prelude::*;
use std::ops::{BitAnd, BitOr};

use super::row_offsets::RowOffsets;
use crate::column::DataType;
use crate::core::datetime::parse_timestamp_ms;
use crate::core::numeric::{is_float, is_integer, parse_i64};
use crate::core::{field_text, split_fields, FieldBound, ParseContext};
use crate::schema::ColumnDescriptor;

/// Set of types a value is compatible with. String compatibility is implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMask(u8);

impl TypeMask {
    pub const NONE: TypeMask = TypeMask(0);
    pub const INT: TypeMask = TypeMask(1);
    pub const FLOAT: TypeMask = TypeMask(1 << 1);
    pub const BOOL: TypeMask = TypeMask(1 << 2);
    pub const DATE: TypeMask = TypeMask(1 << 3);
    pub const ALL: TypeMask = TypeMask(0b1111);

    #[inline]
    pub fn contains(self, other: TypeMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitAnd for TypeMask {
    type Output = TypeMask;
    fn bitand(self, rhs: TypeMask) -> TypeMask {
        TypeMask(self.0 & rhs.0)
    }
}

impl BitOr for TypeMask {
    type Output = TypeMask;
    fn bitor(self, rhs: TypeMask) -> TypeMask {
        TypeMask(self.0 | rhs.0)
    }
}

/// Classify one field's (unquoted) text.
///
/// Precedence is null, boolean token, integer, float, then date. A boolean
/// token is only ever boolean, even when it also reads as a number.
pub fn classify(text: &[u8], ctx: &ParseContext) -> TypeMask {
    if ctx.is_null(text) {
        return TypeMask::ALL;
    }
    if ctx.bool_token(text).is_some() {
        return TypeMask::BOOL;
    }
    let mut mask = TypeMask::NONE;
    if is_integer(text, &ctx.number) {
        // out-of-range integers still read fine as floats
        mask = mask | TypeMask::FLOAT;
        if parse_i64(text, &ctx.number).is_some() {
            mask = mask | TypeMask::INT;
        }
    } else if is_float(text, &ctx.number) {
        mask = mask | TypeMask::FLOAT;
    }
    if ctx.infer_dates && mask == TypeMask::NONE && parse_timestamp_ms(text, ctx.dayfirst).is_some() {
        mask = mask | TypeMask::DATE;
    }
    mask
}

/// Per-column reduction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnStats {
    pub mask: TypeMask,
    pub non_null: usize,
}

impl Default for ColumnStats {
    fn default() -> Self {
        ColumnStats {
            mask: TypeMask::ALL,
            non_null: 0,
        }
    }
}

impl ColumnStats {
    #[inline]
    pub fn observe(&mut self, text: &[u8], ctx: &ParseContext) {
        if ctx.is_null(text) {
            return;
        }
        self.mask = self.mask & classify(text, ctx);
        self.non_null += 1;
    }

    pub fn combine(self, other: ColumnStats) -> ColumnStats {
        ColumnStats {
            mask: self.mask & other.mask,
            non_null: self.non_null + other.non_null,
        }
    }

    /// Least specific type every observed value fits.
    pub fn resolve(&self) -> DataType {
        if self.non_null == 0 {
            DataType::Str
        } else if self.mask.contains(TypeMask::INT) {
            DataType::Int64
        } else if self.mask.contains(TypeMask::FLOAT) {
            DataType::Float64
        } else if self.mask.contains(TypeMask::BOOL) {
            DataType::Bool
        } else if self.mask.contains(TypeMask::DATE) {
            DataType::Date
        } else {
            DataType::Str
        }
    }
}

/// Gather stats for the given column indices over all rows.
pub fn column_stats(
    data: &[u8],
    rows: &RowOffsets,
    ctx: &ParseContext,
    targets: &[usize],
) -> Vec<ColumnStats> {
    let identity = || vec![ColumnStats::default(); targets.len()];
    rows.as_slice()
        .par_iter()
        .fold(
            || (identity(), Vec::<FieldBound>::new()),
            |(mut acc, mut fields), &start| {
                split_fields(data, start, &ctx.dialect, &mut fields);
                for (stats, &col) in acc.iter_mut().zip(targets) {
                    if let Some(&bound) = fields.get(col) {
                        let text = field_text(data, bound, &ctx.dialect, ctx.skip_initial_space);
                        stats.observe(&text, ctx);
                    }
                }
                (acc, fields)
            },
        )
        .map(|(acc, _)| acc)
        .reduce(identity, |a, b| {
            a.into_iter().zip(b).map(|(x, y)| x.combine(y)).collect()
        })
}

/// Resolve a type for every enabled column whose type was not pinned.
pub fn infer_types(
    data: &[u8],
    rows: &RowOffsets,
    ctx: &ParseContext,
    columns: &mut [ColumnDescriptor],
) {
    let targets: Vec<usize> = columns
        .iter()
        .filter(|c| c.flags.enabled && c.flags.infer)
        .map(|c| c.index)
        .collect();
    if targets.is_empty() {
        return;
    }

    let stats = column_stats(data, rows, ctx, &targets);
    for (col, stats) in targets.iter().zip(&stats) {
        let dtype = stats.resolve();
        log::debug!(
            "column {} ({:?}): {} non-null values -> {}",
            col,
            columns[*col].name,
            stats.non_null,
            dtype
        );
        columns[*col].dtype = dtype;
    }
}
