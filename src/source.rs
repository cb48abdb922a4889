// Input data sources
//
// The reader only needs a contiguous byte view of the whole input. Mapping
// files or decompressing is left to implementors of DataSource.

use crate::error::Result;

pub trait DataSource {
    /// Total size in bytes.
    fn size(&self) -> usize;

    /// The complete input.
    fn read_all(&self) -> Result<&[u8]>;
}

impl<T: AsRef<[u8]> + ?Sized> DataSource for T {
    fn size(&self) -> usize {
        self.as_ref().len()
    }

    fn read_all(&self) -> Result<&[u8]> {
        Ok(self.as_ref())
    }
}
