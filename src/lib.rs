// parcsv - Parallel CSV reader producing typed columns
//
// Stages:
// 1: Per-chunk state transition tables (stage::block_scan)
// 2: Row offset resolution + parallel emission (stage::row_offsets)
// 3: Column type inference (stage::infer)
// 4: Row decoding into typed buffers (stage::decode)
//
// reader::CsvReader runs the stages in order over a DataSource.

pub mod column;
pub mod core;
pub mod error;
pub mod options;
pub mod reader;
pub mod schema;
pub mod source;
pub mod stage;

pub use column::{ColumnBuffer, ColumnData, CsvTable, DataType, Value};
pub use crate::core::{Dialect, ParseContext, ParserState};
pub use error::{CsvError, Result};
pub use options::{ColumnRef, ConversionErrorPolicy, Dtypes, ReadWindow, ReaderOptions};
pub use reader::{read_csv, CsvReader};
pub use schema::{ColumnDescriptor, ParseFlags};
pub use source::DataSource;

// ============================================================================
// Allocator Configuration
// ============================================================================

// When memory_tracking is enabled, wrap the allocator to track usage
#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    fn raise_peak(current: usize) {
        let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
        while current > peak {
            match PEAK_ALLOCATED.compare_exchange_weak(peak, current, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                raise_peak(ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

// When memory_tracking is disabled, use mimalloc directly (no overhead).
// Off by default: a global allocator applies to the whole linking binary.
#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Heap accounting. Every function returns 0 unless the `memory_tracking`
/// feature is enabled.
pub mod memory {
    #[cfg(feature = "memory_tracking")]
    use std::sync::atomic::Ordering;

    /// Bytes currently allocated.
    #[cfg(feature = "memory_tracking")]
    pub fn allocated_bytes() -> usize {
        super::tracking::ALLOCATED.load(Ordering::SeqCst)
    }

    /// Highest allocation since start or the last `reset_peak`.
    #[cfg(feature = "memory_tracking")]
    pub fn peak_bytes() -> usize {
        super::tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
    }

    /// Reset the peak to the current allocation; returns `(current, old_peak)`.
    #[cfg(feature = "memory_tracking")]
    pub fn reset_peak() -> (usize, usize) {
        let current = super::tracking::ALLOCATED.load(Ordering::SeqCst);
        let peak = super::tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
        (current, peak)
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn allocated_bytes() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn peak_bytes() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn reset_peak() -> (usize, usize) {
        (0, 0)
    }

}
