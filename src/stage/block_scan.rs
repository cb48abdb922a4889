// Stage 1: per-chunk state transition tables
//
// The input window is cut into fixed-size chunks. Whether a chunk starts
// inside a quote is unknown until the chunks before it are resolved, so each
// chunk is scanned once for every possible incoming state. The tables are
// independent of each other and are filled in parallel.

use rayon::prelude::*;

use crate::core::{Dialect, ParserState, NUM_STATES};
use crate::error::{try_alloc, Result};

/// Outcome of scanning one chunk from a given incoming state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    pub out: ParserState,
    pub rows: usize,
}

/// Transition for every incoming state of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkTransitions {
    entries: [Transition; NUM_STATES],
}

impl ChunkTransitions {
    #[inline]
    pub fn get(&self, incoming: ParserState) -> Transition {
        self.entries[incoming.index()]
    }
}

/// Byte window being scanned. Row starts at or past `end` are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub begin: usize,
    pub end: usize,
}

impl ScanWindow {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunk_count(&self, chunk_size: usize) -> usize {
        self.len().div_ceil(chunk_size)
    }
}

/// Build the transition table of a single chunk located at `base`.
pub fn scan_chunk(bytes: &[u8], base: usize, limit: usize, dialect: &Dialect) -> ChunkTransitions {
    let mut entries = [Transition::default(); NUM_STATES];
    for state in ParserState::ALL {
        let (out, rows) = dialect.scan(bytes, base, state, limit, |_| {});
        entries[state.index()] = Transition { out, rows };
    }
    ChunkTransitions { entries }
}

/// Compute one transition table per chunk of `window`, in parallel.
pub fn scan_blocks(
    data: &[u8],
    window: ScanWindow,
    dialect: &Dialect,
    chunk_size: usize,
) -> Result<Vec<ChunkTransitions>> {
    let mut tables = try_alloc(
        "chunk tables",
        window.chunk_count(chunk_size),
        ChunkTransitions::default(),
    )?;
    let bytes = &data[window.begin..window.end];

    tables
        .par_iter_mut()
        .zip(bytes.par_chunks(chunk_size))
        .enumerate()
        .for_each(|(i, (table, chunk))| {
            *table = scan_chunk(chunk, window.begin + i * chunk_size, window.end, dialect);
        });

    log::trace!(
        "scanned {} chunks of {} bytes over [{}, {})",
        tables.len(),
        chunk_size,
        window.begin,
        window.end
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_table_all_states() {
        let d = Dialect::default();
        // `x"\nb\n`: from unquoted the quote opens and hides the first newline
        let t = scan_chunk(b"x\"\nb\n", 0, 100, &d);
        assert_eq!(
            t.get(ParserState::Unquoted),
            Transition {
                out: ParserState::Quoted,
                rows: 0
            }
        );
        assert_eq!(
            t.get(ParserState::Quoted),
            Transition {
                out: ParserState::Unquoted,
                rows: 2
            }
        );
        assert_eq!(t.get(ParserState::QuoteClosing).rows, 0);
        // a comment is closed by the first newline, which still ends a row
        assert_eq!(t.get(ParserState::Comment).rows, 2);
    }

    #[test]
    fn test_scan_blocks_chunk_count() {
        let d = Dialect::default();
        let data = b"a\nb\nc\nd\n";
        let window = ScanWindow { begin: 0, end: 8 };
        let tables = scan_blocks(data, window, &d, 3).unwrap();
        assert_eq!(tables.len(), 3);
        let total: usize = tables
            .iter()
            .map(|t| t.get(ParserState::Unquoted).rows)
            .sum();
        // the start after the final newline is at the window end
        assert_eq!(total, 3);
    }

    #[test]
    fn test_empty_window() {
        let d = Dialect::default();
        let tables = scan_blocks(b"abc", ScanWindow { begin: 2, end: 2 }, &d, 4).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_tables_independent_of_neighbours() {
        let d = Dialect::default();
        let data = b"\"a\nb\"\nc\n";
        let window = ScanWindow { begin: 0, end: data.len() };
        let tables = scan_blocks(data, window, &d, 2).unwrap();
        for (i, chunk) in data.chunks(2).enumerate() {
            assert_eq!(tables[i], scan_chunk(chunk, i * 2, data.len(), &d));
        }
    }
}
