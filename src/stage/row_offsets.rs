// Stage 2: row offset resolution
//
// Strategy:
// 1. Sequential over chunks (not bytes): thread the real parser state
//    through the per-chunk tables, giving every chunk its true incoming
//    state and the index of its first row.
// 2. Parallel: rescan every chunk from its resolved state and write its row
//    starts into its own slice of an exactly-sized offset vector.
//
// Row ranges, blank lines and skip/limit trimming are applied to the
// resolved offsets afterwards; they never change how chunks are scanned.

use rayon::prelude::*;

use super::block_scan::{scan_blocks, ChunkTransitions, ScanWindow};
use crate::core::{is_blank_row, Dialect, ParserState};
use crate::error::{try_alloc, CsvError, Result};

/// Resolved entry state of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStart {
    pub state: ParserState,
    /// Index (among the emitted starts) of this chunk's first row.
    pub first_row: usize,
    pub rows: usize,
}

/// Ordered row start positions within the data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowOffsets {
    starts: Vec<usize>,
}

impl RowOffsets {
    pub fn new(starts: Vec<usize>) -> Self {
        debug_assert!(starts.windows(2).all(|w| w[0] < w[1]));
        RowOffsets { starts }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<usize> {
        self.starts.get(row).copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.starts
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.starts
    }

    /// Drop empty rows and rows opening with the comment character.
    pub fn without_blank_rows(self, data: &[u8], dialect: &Dialect) -> Self {
        let starts: Vec<usize> = self
            .starts
            .into_par_iter()
            .filter(|&s| !is_blank_row(data, s, dialect))
            .collect();
        RowOffsets { starts }
    }

    /// Drop `front` rows from the start and `back` from the end, then keep at
    /// most `limit` rows.
    pub fn trim(&mut self, front: usize, back: usize, limit: Option<usize>) -> Result<()> {
        let n = self.starts.len();
        if front.saturating_add(back) > n {
            return Err(CsvError::InputBounds(format!(
                "cannot skip {} leading and {} trailing rows of {}",
                front, back, n
            )));
        }
        let mut end = n - back;
        if let Some(limit) = limit {
            end = end.min(front.saturating_add(limit));
        }
        self.starts.truncate(end);
        self.starts.drain(..front);
        Ok(())
    }
}

/// Thread the real state through the chunk tables.
///
/// Returns each chunk's entry state and first row index, plus the total row
/// count. Cost is linear in the number of chunks.
pub fn resolve_chunk_states(
    tables: &[ChunkTransitions],
    initial: ParserState,
) -> (Vec<ChunkStart>, usize) {
    let mut starts = Vec::with_capacity(tables.len());
    let mut state = initial;
    let mut total = 0;
    for table in tables {
        let t = table.get(state);
        starts.push(ChunkStart {
            state,
            first_row: total,
            rows: t.rows,
        });
        total += t.rows;
        state = t.out;
    }
    (starts, total)
}

/// Rescan every chunk from its resolved state, writing row starts into
/// `out` (length = total rows). Each chunk owns a disjoint slice.
pub fn emit_row_offsets(
    data: &[u8],
    window: ScanWindow,
    dialect: &Dialect,
    chunk_size: usize,
    chunks: &[ChunkStart],
    out: &mut [usize],
) {
    let mut slices = Vec::with_capacity(chunks.len());
    let mut rest = out;
    for chunk in chunks {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk.rows);
        slices.push(head);
        rest = tail;
    }
    debug_assert!(rest.is_empty());

    let bytes = &data[window.begin..window.end];
    slices
        .into_par_iter()
        .zip(bytes.par_chunks(chunk_size))
        .zip(chunks.par_iter())
        .enumerate()
        .for_each(|(i, ((slots, bytes), chunk))| {
            let mut k = 0;
            dialect.scan(
                bytes,
                window.begin + i * chunk_size,
                chunk.state,
                window.end,
                |pos| {
                    slots[k] = pos;
                    k += 1;
                },
            );
            debug_assert_eq!(k, slots.len());
        });
}

/// First byte to scan and whether offset 0 is a row start.
fn scan_origin(range_begin: usize, range_end: usize) -> (usize, bool) {
    if range_begin == 0 {
        (0, range_end > 0)
    } else {
        // a terminator right before the range makes range_begin a row start
        (range_begin - 1, false)
    }
}

/// Find every row starting in `[range_begin, range_end)`.
///
/// The state at `range_begin` is taken to be unquoted. A partial row before
/// the first row start is excluded; the last row may run past `range_end`.
pub fn gather_row_offsets(
    data: &[u8],
    dialect: &Dialect,
    range_begin: usize,
    range_end: usize,
    chunk_size: usize,
) -> Result<RowOffsets> {
    if range_begin > data.len() {
        return Err(CsvError::InputBounds(format!(
            "range offset {} is past the end of {} bytes",
            range_begin,
            data.len()
        )));
    }
    let range_end = range_end.min(data.len()).max(range_begin);
    let (scan_begin, leading) = scan_origin(range_begin, range_end);
    let window = ScanWindow {
        begin: scan_begin,
        end: range_end,
    };

    let tables = scan_blocks(data, window, dialect, chunk_size)?;
    let (chunks, total) = resolve_chunk_states(&tables, ParserState::Unquoted);
    log::debug!(
        "resolved {} chunks over [{}, {}): {} row terminators",
        chunks.len(),
        scan_begin,
        range_end,
        total
    );

    let lead = usize::from(leading);
    let mut starts = try_alloc("row offsets", total + lead, 0usize)?;
    emit_row_offsets(
        data,
        window,
        dialect,
        chunk_size,
        &chunks,
        &mut starts[lead..],
    );
    Ok(RowOffsets::new(starts))
}

/// Single-threaded reference scan with the same range semantics as
/// [`gather_row_offsets`].
pub fn sequential_row_offsets(
    data: &[u8],
    dialect: &Dialect,
    range_begin: usize,
    range_end: usize,
) -> Vec<usize> {
    let range_begin = range_begin.min(data.len());
    let range_end = range_end.min(data.len()).max(range_begin);
    let (scan_begin, leading) = scan_origin(range_begin, range_end);
    let mut starts = Vec::new();
    if leading {
        starts.push(0);
    }
    dialect.scan(
        &data[scan_begin..range_end],
        scan_begin,
        ParserState::Unquoted,
        range_end,
        |p| starts.push(p),
    );
    starts
}

/// Start of the `n`-th row from the beginning of the data, scanning only as
/// far as needed. Used to find a header row during a byte-range read.
pub fn nth_row_start(data: &[u8], dialect: &Dialect, n: usize, skip_blank: bool) -> Option<usize> {
    let mut seen = 0;
    let mut state = ParserState::Unquoted;
    let mut start = 0;
    let mut pos = 0;
    while start < data.len() {
        if !(skip_blank && is_blank_row(data, start, dialect)) {
            if seen == n {
                return Some(start);
            }
            seen += 1;
        }
        // advance to the next row start
        loop {
            if pos >= data.len() {
                return None;
            }
            let byte = data[pos];
            let ends = dialect.ends_row(state, byte);
            state = dialect.transition(state, byte);
            pos += 1;
            if ends {
                break;
            }
        }
        start = pos;
    }
    None
}
