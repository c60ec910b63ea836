//! Benchmark fixtures for the cbridge native memory bridge.
//!
//! - [`RecordArray`]: a native array of C-layout records that benchmarks
//!   walk by address arithmetic, the way generated code does

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cbridge_core::Address;
use cbridge_raw::Pinned;

/// Byte layout of one record:
///
/// ```text
/// struct record { int32_t id; /* pad */ int64_t count; double weight; };
/// ```
pub mod layout {
    /// Offset of `id`.
    pub const ID: u64 = 0;
    /// Offset of `count`.
    pub const COUNT: u64 = 8;
    /// Offset of `weight`.
    pub const WEIGHT: u64 = 16;
    /// `sizeof(struct record)`.
    pub const SIZE: u64 = 24;
}

/// A pinned native array of zeroed records.
pub struct RecordArray {
    buffer: Pinned,
    len: usize,
}

impl RecordArray {
    /// Allocate `len` zeroed records.
    pub fn zeroed(len: usize) -> Self {
        Self {
            buffer: Pinned::zeroed(len * layout::SIZE as usize),
            len,
        }
    }

    /// Address of record `i`. Not bounds-checked.
    pub fn record(&self, i: usize) -> Address {
        self.buffer.address().add(i as u64 * layout::SIZE)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array holds no records.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_contiguous() {
        let records = RecordArray::zeroed(4);
        assert_eq!(records.len(), 4);
        assert_eq!(
            records.record(3).distance_from(records.record(0)),
            3 * layout::SIZE as i64
        );
    }
}
