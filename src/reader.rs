// Read orchestration
//
// bytes -> block scan -> row offsets -> blank filter -> trim -> columns
//       -> inference -> decode -> CsvTable
//
// Every stage runs to completion before the next starts. Any error aborts
// the read; nothing partial is returned.

use crate::column::CsvTable;
use crate::core::{field_text, split_fields, FieldBound, ParseContext};
use crate::error::{CsvError, Result};
use crate::options::{ReadWindow, ReaderOptions};
use crate::schema::{build_columns, column_names};
use crate::source::DataSource;
use crate::stage::{decode_rows, gather_row_offsets, infer_types, nth_row_start, RowOffsets};

/// A configured reader. Cheap to reuse across inputs.
#[derive(Debug, Clone)]
pub struct CsvReader {
    options: ReaderOptions,
    ctx: ParseContext,
}

impl CsvReader {
    pub fn new(options: ReaderOptions) -> Result<Self> {
        let ctx = ParseContext::new(&options)?;
        Ok(CsvReader { options, ctx })
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn context(&self) -> &ParseContext {
        &self.ctx
    }

    /// Read the rows of `source` selected by `window` into typed columns.
    pub fn read<S: DataSource + ?Sized>(&self, source: &S, window: ReadWindow) -> Result<CsvTable> {
        let size = source.size();
        if window.range_offset > size {
            return Err(CsvError::InputBounds(format!(
                "range offset {} is past the end of {} bytes",
                window.range_offset, size
            )));
        }
        let range_end = if window.range_size == 0 {
            size
        } else {
            window.range_offset.saturating_add(window.range_size).min(size)
        };
        let data = source.read_all()?;
        let ctx = &self.ctx;

        let mut rows = gather_row_offsets(
            data,
            &ctx.dialect,
            window.range_offset,
            range_end,
            ctx.chunk_size,
        )?;
        if ctx.skip_blank_lines {
            rows = rows.without_blank_rows(data, &ctx.dialect);
        }
        log::debug!(
            "{} rows in byte range [{}, {})",
            rows.len(),
            window.range_offset,
            range_end
        );

        let (header_start, front) = self.leading_rows(data, &rows, &window)?;
        let header = header_start.map(|start| self.row_text(data, start));
        // counted before trimming so an emptied window keeps its columns
        let count = match (&self.options.names, &header) {
            (Some(names), _) => names.len(),
            (None, Some(header)) => header.len(),
            (None, None) => rows.get(front).map_or(0, |start| self.field_count(data, start)),
        };
        rows.trim(front, window.skip_rows_end, window.num_rows)?;
        let mut columns = build_columns(column_names(header, count, &self.options), &self.options)?;

        infer_types(data, &rows, ctx, &mut columns);
        let columns = decode_rows(data, &rows, ctx, &columns)?;
        log::debug!("decoded {} columns x {} rows", columns.len(), rows.len());
        Ok(CsvTable { columns })
    }

    /// Start of the header row (if any) and how many resolved rows precede
    /// the first data row.
    ///
    /// Leading rows are `skip_rows` then the header. For a byte range that
    /// does not begin at 0 they are located from the start of the data, and
    /// only those that fall inside the range are dropped from it.
    fn leading_rows(
        &self,
        data: &[u8],
        rows: &RowOffsets,
        window: &ReadWindow,
    ) -> Result<(Option<usize>, usize)> {
        let header = self.options.header;
        let leading = window
            .skip_rows
            .saturating_add(header.map_or(0, |h| h.saturating_add(1)));
        if leading == 0 {
            return Ok((None, 0));
        }
        let last = if window.range_offset == 0 {
            rows.get(leading - 1)
        } else {
            nth_row_start(data, &self.ctx.dialect, leading - 1, self.ctx.skip_blank_lines)
        };
        let last = last.ok_or_else(|| {
            CsvError::InputBounds(match header {
                Some(_) => format!("header row {} not found", leading - 1),
                None => format!("cannot skip {} rows", leading),
            })
        })?;
        let front = rows.as_slice().partition_point(|&s| s <= last);
        Ok((header.map(|_| last), front))
    }

    fn row_text(&self, data: &[u8], start: usize) -> Vec<String> {
        let mut fields: Vec<FieldBound> = Vec::new();
        split_fields(data, start, &self.ctx.dialect, &mut fields);
        fields
            .iter()
            .map(|&bound| {
                let text = field_text(data, bound, &self.ctx.dialect, self.ctx.skip_initial_space);
                String::from_utf8_lossy(&text).into_owned()
            })
            .collect()
    }

    fn field_count(&self, data: &[u8], start: usize) -> usize {
        let mut fields: Vec<FieldBound> = Vec::new();
        split_fields(data, start, &self.ctx.dialect, &mut fields);
        fields.len()
    }
}

/// Read all of `data` with `options`.
pub fn read_csv(data: &[u8], options: &ReaderOptions) -> Result<CsvTable> {
    CsvReader::new(options.clone())?.read(data, ReadWindow::all())
}
