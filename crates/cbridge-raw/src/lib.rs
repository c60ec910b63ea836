//! Raw memory access through native addresses.
//!
//! Every operation here is a single, unchecked memory access: no bounds,
//! alignment or provenance validation is performed, because the embedded
//! language relies on raw pointer arithmetic succeeding. This crate is one
//! of the three that may contain `unsafe` code (with `cbridge-arena` and
//! `cbridge-ffi`); every block carries a `// SAFETY:` comment.
//!
//! - [`scalar`]: typed reads and writes of int32, int64, float64, char16
//! - [`buffer`]: byte range copies and [`Pinned`] buffers
//! - [`timeval`]: `struct timeval` subtraction through addresses

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod buffer;
pub mod scalar;
pub mod timeval;

pub use buffer::{pin_address, read_bytes, write_bytes, Pinned};
pub use scalar::{read, write};
pub use timeval::timestamp_diff_ms;
