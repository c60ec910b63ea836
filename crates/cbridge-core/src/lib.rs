//! Core types for the cbridge native memory bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: the [`Address`] handle,
//! scalar views, C type sizes, timestamp arithmetic, configuration and
//! error types. Nothing here touches raw memory.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod address;
pub mod arity;
pub mod config;
pub mod ctype;
pub mod error;
pub mod scalar;
pub mod time;

pub use address::Address;
pub use arity::Arity;
pub use config::ArenaConfig;
pub use ctype::{eof_sentinel, sizeof_scalar, CType, EOF};
pub use error::{BridgeError, ConfigError};
pub use scalar::{Scalar, ScalarKind};
pub use time::TimeDelta;
