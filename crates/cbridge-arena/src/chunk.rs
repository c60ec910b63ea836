//! Fixed-size memory chunks and growable chunk lists.
//!
//! A [`Chunk`] is one zero-initialized heap block with a bump cursor. A
//! [`ChunkList`] appends chunks as the current one fills up. Chunks never
//! move or resize, so every pointer they hand out stays valid until the
//! list is reset or dropped.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use cbridge_core::ArenaConfig;

/// Round `len` up to the cell alignment.
fn align_up(len: usize) -> usize {
    let align = ArenaConfig::CELL_ALIGN;
    (len + align - 1) & !(align - 1)
}

/// A single heap block with bump allocation.
///
/// Allocation failure when creating a chunk is fatal
/// ([`alloc::handle_alloc_error`]), the same policy as `Box` and `Vec`.
pub struct Chunk {
    ptr: NonNull<u8>,
    layout: Layout,
    /// Next free byte.
    cursor: usize,
}

// SAFETY: a Chunk uniquely owns its allocation. The raw pointers it hands
// out are addresses for the embedded language, not Rust references.
unsafe impl Send for Chunk {}

impl Chunk {
    /// Allocate a zeroed chunk of at least `bytes` bytes.
    pub fn new(bytes: usize) -> Self {
        let size = align_up(bytes.max(1));
        let layout = match Layout::from_size_align(size, ArenaConfig::CELL_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("chunk of {bytes} bytes exceeds isize::MAX"),
        };
        // SAFETY: layout has non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = match NonNull::new(raw) {
            Some(p) => p,
            None => alloc::handle_alloc_error(layout),
        };
        Self {
            ptr,
            layout,
            cursor: 0,
        }
    }

    /// Bump-allocate `len` zeroed bytes, 8-byte aligned.
    ///
    /// Returns `None` if the chunk has insufficient remaining capacity.
    pub fn alloc(&mut self, len: usize) -> Option<NonNull<u8>> {
        let new_cursor = self.cursor.checked_add(align_up(len))?;
        if new_cursor > self.capacity() {
            return None;
        }
        // SAFETY: cursor <= new_cursor <= capacity, so the offset and the
        // `len` bytes after it are inside the allocation.
        let cell = unsafe {
            let p = self.ptr.as_ptr().add(self.cursor);
            // Memory from before a reset may hold stale cells.
            std::ptr::write_bytes(p, 0, len);
            NonNull::new_unchecked(p)
        };
        self.cursor = new_cursor;
        Some(cell)
    }

    /// Rewind the bump pointer. Earlier allocations become dangling.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Remaining free bytes.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.cursor
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated in `new` with exactly this layout.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

/// A growable list of [`Chunk`]s with overflow-based bump allocation.
///
/// When the current chunk is full the next one is used, reusing chunks
/// kept from before the last reset before allocating new ones. Cells
/// larger than `chunk_bytes` get a dedicated chunk that is released on
/// reset.
pub struct ChunkList {
    chunks: Vec<Chunk>,
    oversized: Vec<Chunk>,
    chunk_bytes: usize,
    /// Index of the chunk currently being filled.
    current: usize,
}

impl ChunkList {
    /// Create a list with one pre-allocated chunk.
    pub fn new(chunk_bytes: usize) -> Self {
        Self {
            chunks: vec![Chunk::new(chunk_bytes)],
            oversized: Vec::new(),
            chunk_bytes,
            current: 0,
        }
    }

    /// Bump-allocate `len` zeroed bytes. Never fails short of fatal OOM.
    pub fn alloc(&mut self, len: usize) -> NonNull<u8> {
        if align_up(len) > self.chunk_bytes {
            let mut chunk = Chunk::new(len);
            let cell = chunk
                .alloc(len)
                .unwrap_or_else(|| unreachable!("dedicated chunk fits its cell"));
            self.oversized.push(chunk);
            return cell;
        }

        if let Some(cell) = self.chunks[self.current].alloc(len) {
            return cell;
        }

        let next = self.current + 1;
        if next < self.chunks.len() {
            if let Some(cell) = self.chunks[next].alloc(len) {
                self.current = next;
                return cell;
            }
        }

        let mut chunk = Chunk::new(self.chunk_bytes);
        let cell = chunk
            .alloc(len)
            .unwrap_or_else(|| unreachable!("len <= chunk_bytes, so a fresh chunk always fits"));
        self.chunks.push(chunk);
        self.current = self.chunks.len() - 1;
        log::debug!(
            "cell arena grew to {} chunks of {} bytes",
            self.chunks.len(),
            self.chunk_bytes
        );
        cell
    }

    /// Rewind every chunk and free oversized ones.
    pub fn reset(&mut self) {
        for chunk in &mut self.chunks {
            chunk.reset();
        }
        self.oversized.clear();
        self.current = 0;
    }

    /// Number of chunks, oversized ones included.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len() + self.oversized.len()
    }

    /// Bytes handed out across all chunks.
    pub fn used_bytes(&self) -> usize {
        self.chunks
            .iter()
            .chain(&self.oversized)
            .map(Chunk::used)
            .sum()
    }

    /// Bytes allocated from the system across all chunks.
    pub fn capacity_bytes(&self) -> usize {
        self.chunks
            .iter()
            .chain(&self.oversized)
            .map(Chunk::capacity)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_aligned_and_zeroed() {
        let mut chunk = Chunk::new(64);
        let a = chunk.alloc(2).unwrap();
        let b = chunk.alloc(4).unwrap();
        assert_eq!(a.as_ptr() as usize % 8, 0);
        assert_eq!(b.as_ptr() as usize % 8, 0);
        assert_eq!(b.as_ptr() as usize - a.as_ptr() as usize, 8);
        assert_eq!(unsafe { *b.as_ptr() }, 0);
        assert_eq!(chunk.used(), 16);
    }

    #[test]
    fn full_chunk_returns_none() {
        let mut chunk = Chunk::new(16);
        assert!(chunk.alloc(8).is_some());
        assert!(chunk.alloc(8).is_some());
        assert!(chunk.alloc(1).is_none());
        assert_eq!(chunk.remaining(), 0);
    }

    #[test]
    fn reset_rezeroes_on_next_alloc() {
        let mut chunk = Chunk::new(64);
        let p = chunk.alloc(8).unwrap();
        unsafe { p.as_ptr().write(0xFF) };
        chunk.reset();
        let q = chunk.alloc(8).unwrap();
        assert_eq!(p, q);
        assert_eq!(unsafe { *q.as_ptr() }, 0);
    }

    #[test]
    fn list_grows_into_new_chunk() {
        let mut list = ChunkList::new(64);
        for _ in 0..8 {
            list.alloc(8);
        }
        assert_eq!(list.chunk_count(), 1);
        list.alloc(8);
        assert_eq!(list.chunk_count(), 2);
        assert_eq!(list.used_bytes(), 72);
    }

    #[test]
    fn list_reuses_chunks_after_reset() {
        let mut list = ChunkList::new(64);
        for _ in 0..20 {
            list.alloc(8);
        }
        let chunks = list.chunk_count();
        list.reset();
        assert_eq!(list.used_bytes(), 0);
        for _ in 0..20 {
            list.alloc(8);
        }
        assert_eq!(list.chunk_count(), chunks);
    }

    #[test]
    fn oversized_cells_get_dedicated_chunks() {
        let mut list = ChunkList::new(64);
        let big = list.alloc(1000);
        assert_eq!(big.as_ptr() as usize % 8, 0);
        assert_eq!(list.chunk_count(), 2);
        assert!(list.capacity_bytes() >= 64 + 1000);
        list.reset();
        assert_eq!(list.chunk_count(), 1);
    }
}
