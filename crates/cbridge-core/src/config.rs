//! Arena configuration parameters.

use crate::error::ConfigError;

/// Configuration for the cell arena.
///
/// Cells are bump-allocated out of fixed-size chunks. A chunk is never
/// moved or resized once created, so addresses stay stable until the arena
/// is reset or dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Size of each chunk in bytes.
    ///
    /// Default: 65_536. Must be a power of two between
    /// [`MIN_CHUNK_BYTES`](ArenaConfig::MIN_CHUNK_BYTES) and
    /// [`MAX_CHUNK_BYTES`](ArenaConfig::MAX_CHUNK_BYTES). Cells larger
    /// than a chunk get a dedicated chunk of their own.
    pub chunk_bytes: usize,
}

impl ArenaConfig {
    /// Default chunk size: 64 KiB.
    pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

    /// Smallest accepted chunk size.
    pub const MIN_CHUNK_BYTES: usize = 64;

    /// Largest accepted chunk size: 1 GiB.
    pub const MAX_CHUNK_BYTES: usize = 1 << 30;

    /// Alignment of every cell, in bytes.
    pub const CELL_ALIGN: usize = 8;

    /// Config with the given chunk size.
    pub fn with_chunk_bytes(chunk_bytes: usize) -> Self {
        Self { chunk_bytes }
    }

    /// Check the invariants documented on each field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_bytes < Self::MIN_CHUNK_BYTES {
            return Err(ConfigError::ChunkTooSmall {
                chunk_bytes: self.chunk_bytes,
                min: Self::MIN_CHUNK_BYTES,
            });
        }
        if self.chunk_bytes > Self::MAX_CHUNK_BYTES {
            return Err(ConfigError::ChunkTooLarge {
                chunk_bytes: self.chunk_bytes,
                max: Self::MAX_CHUNK_BYTES,
            });
        }
        if !self.chunk_bytes.is_power_of_two() {
            return Err(ConfigError::ChunkNotPowerOfTwo {
                chunk_bytes: self.chunk_bytes,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::with_chunk_bytes(Self::DEFAULT_CHUNK_BYTES)
    }
}
