// Pipeline stages
//
// Each stage is a rayon parallel pass; the caller waits for one stage to
// finish before starting the next.

pub mod block_scan;
pub mod decode;
pub mod infer;
pub mod row_offsets;

pub use block_scan::{scan_blocks, scan_chunk, ChunkTransitions, ScanWindow, Transition};
pub use decode::{decode_rows, DECODE_BLOCK_ROWS};
pub use infer::{classify, column_stats, infer_types, ColumnStats, TypeMask};
pub use row_offsets::{
    emit_row_offsets, gather_row_offsets, nth_row_start, resolve_chunk_states,
    sequential_row_offsets, ChunkStart, RowOffsets,
};
