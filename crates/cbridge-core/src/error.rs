//! Error types for the cbridge workspace.
//!
//! Only conditions the embedded language can recover from are errors.
//! Invalid addresses, wrong-width reads and allocator exhaustion stay
//! undefined or fatal and never show up here.

use thiserror::Error;

use crate::Arity;

/// Recoverable failures at the bridge boundary.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// Every trampoline of this arity is bound to a live callback.
    #[error("all {capacity} arity-{arity} trampolines are bound; release one first")]
    PoolExhausted {
        /// The arity that ran out of trampolines.
        arity: Arity,
        /// Number of trampolines per arity.
        capacity: usize,
    },
    /// A callback token that was never issued or was already released.
    #[error("callback token {token:#x} is not bound")]
    StaleToken {
        /// The rejected token.
        token: u64,
    },
    /// A null callback or function pointer was supplied.
    #[error("callback is null")]
    NullCallback,
    /// An argument count outside `1..=3`.
    #[error("unsupported callback arity {count}")]
    InvalidArity {
        /// The requested argument count.
        count: u32,
    },
}

/// Configuration validation failures.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Chunk size below the minimum.
    #[error("chunk size {chunk_bytes} bytes is below the minimum of {min} bytes")]
    ChunkTooSmall {
        /// The requested chunk size.
        chunk_bytes: usize,
        /// The smallest accepted chunk size.
        min: usize,
    },
    /// Chunk size above the maximum.
    #[error("chunk size {chunk_bytes} bytes exceeds the maximum of {max} bytes")]
    ChunkTooLarge {
        /// The requested chunk size.
        chunk_bytes: usize,
        /// The largest accepted chunk size.
        max: usize,
    },
    /// Chunk size is not a power of two.
    #[error("chunk size {chunk_bytes} bytes is not a power of two")]
    ChunkNotPowerOfTwo {
        /// The requested chunk size.
        chunk_bytes: usize,
    },
}
