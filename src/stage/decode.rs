// Stage 4: row decoding into typed columns
//
// Output columns are allocated at their final length, then cut into blocks
// of DECODE_BLOCK_ROWS rows. One rayon task owns block `b` of every column,
// so each cell is written by exactly one task and nothing is shared mutably.

use rayon::prelude::*;

use super::row_offsets::RowOffsets;
use crate::column::{CellBlockMut, ColumnBuffer, ValuesMut};
use crate::core::datetime::parse_timestamp_ms;
use crate::core::numeric::{parse_f64, parse_i64};
use crate::core::{field_text, split_fields, FieldBound, ParseContext};
use crate::error::{CsvError, Result};
use crate::options::ConversionErrorPolicy;
use crate::schema::ColumnDescriptor;

/// Rows handled by one decode task.
pub const DECODE_BLOCK_ROWS: usize = 1024;

/// Decode every enabled column of `columns` over `rows`.
///
/// Output columns follow the order of `columns`, disabled ones left out.
pub fn decode_rows(
    data: &[u8],
    rows: &RowOffsets,
    ctx: &ParseContext,
    columns: &[ColumnDescriptor],
) -> Result<Vec<ColumnBuffer>> {
    decode_rows_with_block(data, rows, ctx, columns, DECODE_BLOCK_ROWS)
}

pub(crate) fn decode_rows_with_block(
    data: &[u8],
    rows: &RowOffsets,
    ctx: &ParseContext,
    columns: &[ColumnDescriptor],
    block_rows: usize,
) -> Result<Vec<ColumnBuffer>> {
    let enabled: Vec<&ColumnDescriptor> = columns.iter().filter(|c| c.flags.enabled).collect();
    let mut buffers = enabled
        .iter()
        .map(|c| ColumnBuffer::allocate(c.name.clone(), c.dtype, rows.len()))
        .collect::<Result<Vec<_>>>()?;

    let block_rows = block_rows.max(1);
    let num_blocks = rows.len().div_ceil(block_rows);
    log::debug!(
        "decoding {} rows x {} columns in {} blocks",
        rows.len(),
        enabled.len(),
        num_blocks
    );

    // transpose column-major blocks into one cell set per row block
    let mut per_column: Vec<_> = buffers
        .iter_mut()
        .map(|b| b.blocks_mut(block_rows).into_iter())
        .collect();
    let blocks: Vec<Vec<CellBlockMut<'_>>> = (0..num_blocks)
        .map(|_| per_column.iter_mut().filter_map(Iterator::next).collect())
        .collect();

    let offsets = rows.as_slice();
    let expected = columns.len();
    blocks
        .into_par_iter()
        .enumerate()
        .try_for_each(|(b, mut cells)| {
            let first = b * block_rows;
            let starts = &offsets[first..(first + block_rows).min(offsets.len())];
            decode_block(data, starts, first, ctx, &enabled, expected, &mut cells)
        })?;

    Ok(buffers)
}

fn decode_block(
    data: &[u8],
    starts: &[usize],
    first_row: usize,
    ctx: &ParseContext,
    columns: &[&ColumnDescriptor],
    expected: usize,
    cells: &mut [CellBlockMut<'_>],
) -> Result<()> {
    let mut fields: Vec<FieldBound> = Vec::with_capacity(expected);
    for (r, &start) in starts.iter().enumerate() {
        split_fields(data, start, &ctx.dialect, &mut fields);
        if ctx.strict && fields.len() != expected {
            return Err(CsvError::MalformedRow {
                row: first_row + r,
                expected,
                found: fields.len(),
            });
        }
        for (cell, column) in cells.iter_mut().zip(columns) {
            // missing trailing fields stay null
            let Some(&bound) = fields.get(column.index) else {
                continue;
            };
            let text = field_text(data, bound, &ctx.dialect, ctx.skip_initial_space);
            if ctx.is_null(&text) {
                continue;
            }
            if !write_cell(cell, r, &text, ctx) {
                match ctx.on_conversion_error {
                    ConversionErrorPolicy::Null => {}
                    ConversionErrorPolicy::Fail => {
                        return Err(CsvError::TypeConversion {
                            row: first_row + r,
                            column: column.name.clone(),
                            dtype: column.dtype,
                            value: String::from_utf8_lossy(&text).into_owned(),
                        })
                    }
                }
            }
        }
    }
    Ok(())
}

/// Convert `text` into slot `r`; false when it does not parse.
#[inline]
fn write_cell(cell: &mut CellBlockMut<'_>, r: usize, text: &[u8], ctx: &ParseContext) -> bool {
    let ok = match &mut cell.values {
        ValuesMut::Int64(v) => parse_i64(text, &ctx.number).map(|x| v[r] = x).is_some(),
        ValuesMut::Float64(v) => parse_f64(text, &ctx.number).map(|x| v[r] = x).is_some(),
        ValuesMut::Bool(v) => ctx.bool_token(text).map(|x| v[r] = x).is_some(),
        ValuesMut::Date(v) => parse_timestamp_ms(text, ctx.dayfirst)
            .map(|x| v[r] = x)
            .is_some(),
        ValuesMut::Str(v) => {
            v[r] = String::from_utf8_lossy(text).into_owned();
            true
        }
    };
    if ok {
        cell.validity[r] = true;
    }
    ok
}
