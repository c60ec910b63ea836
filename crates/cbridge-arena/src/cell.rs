//! Boxed scalar cells.

use cbridge_core::{Address, ArenaConfig, ConfigError, Scalar};

use crate::chunk::ChunkList;

/// Arena of boxed scalar cells.
///
/// [`boxed_address`](CellArena::boxed_address) is the embedded language's
/// `&x` for a value that only exists on the managed side: it copies the
/// value into a fresh native cell and returns the cell's address. Cells
/// are never freed individually. [`reset`](CellArena::reset) invalidates
/// all of them at once; dropping the arena returns the memory.
pub struct CellArena {
    config: ArenaConfig,
    chunks: ChunkList,
    cells: usize,
}

impl CellArena {
    /// Create an arena, validating `config`.
    pub fn new(config: ArenaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            chunks: ChunkList::new(config.chunk_bytes),
            config,
            cells: 0,
        })
    }

    /// Copy `value` into a new zeroed cell of the scalar's width and
    /// return its address.
    ///
    /// The cell is 8-byte aligned and valid until the next
    /// [`reset`](CellArena::reset) or until the arena is dropped.
    pub fn boxed_address<T: Scalar>(&mut self, value: T) -> Address {
        let cell = self.chunks.alloc(T::KIND.width()).cast::<T>();
        // SAFETY: the chunk list returned `T::KIND.width()` (= `size_of::<T>()`)
        // fresh bytes aligned to CELL_ALIGN (8), enough for every Scalar.
        unsafe { cell.as_ptr().write(value) };
        self.cells += 1;
        Address::from_mut_ptr(cell.as_ptr())
    }

    /// Invalidate every cell handed out so far.
    ///
    /// Chunk memory is kept for reuse; addresses obtained before the reset
    /// may alias cells allocated after it.
    pub fn reset(&mut self) {
        log::debug!(
            "resetting cell arena: {} cells, {} bytes in {} chunks",
            self.cells,
            self.chunks.used_bytes(),
            self.chunks.chunk_count()
        );
        self.chunks.reset();
        self.cells = 0;
    }

    /// Cells allocated since creation or the last reset.
    pub fn cell_count(&self) -> usize {
        self.cells
    }

    /// Chunks currently held.
    pub fn chunk_count(&self) -> usize {
        self.chunks.chunk_count()
    }

    /// Bytes handed out, including alignment padding.
    pub fn used_bytes(&self) -> usize {
        self.chunks.used_bytes()
    }

    /// Bytes held from the system.
    pub fn capacity_bytes(&self) -> usize {
        self.chunks.capacity_bytes()
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }
}

impl Default for CellArena {
    fn default() -> Self {
        Self {
            chunks: ChunkList::new(ArenaConfig::DEFAULT_CHUNK_BYTES),
            config: ArenaConfig::default(),
            cells: 0,
        }
    }
}

impl std::fmt::Debug for CellArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellArena")
            .field("config", &self.config)
            .field("cells", &self.cells)
            .field("chunks", &self.chunk_count())
            .field("used_bytes", &self.used_bytes())
            .finish()
    }
}
