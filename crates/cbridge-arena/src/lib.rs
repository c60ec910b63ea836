//! Chunked bump arena backing the embedded language's `&x`.
//!
//! Taking the address of a boxed scalar needs a native cell that outlives
//! the call. Cells are bump-allocated from fixed-size chunks and are never
//! freed one by one; instead the whole arena is torn down at a lifecycle
//! boundary (one embedded-program run) with [`CellArena::reset`].
//!
//! ```text
//! CellArena
//! └── ChunkList
//!     ├── Chunk[]     (chunk_bytes each, bump-allocated, reused after reset)
//!     └── oversized[] (one dedicated chunk per cell larger than chunk_bytes)
//! ```
//!
//! This crate may contain `unsafe` code; chunks hand out raw pointers into
//! memory they own.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod cell;
pub mod chunk;

pub use cell::CellArena;
pub use cbridge_core::ArenaConfig;
pub use chunk::{Chunk, ChunkList};
