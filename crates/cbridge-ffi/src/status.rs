//! C-compatible status codes.
//!
//! [`CbStatus`] is a `repr(i32)` enum covering the recoverable conditions
//! of the bridge. Undefined-behavior conditions (bad addresses, wrong
//! widths) have no status: they are not detected.

use cbridge_core::{BridgeError, ConfigError};

/// C-compatible status code returned by status-returning FFI functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CbStatus {
    /// Success.
    Ok = 0,
    /// Callback token is invalid or was already released.
    InvalidHandle = -1,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -2,
    /// Every trampoline of the requested arity is bound.
    PoolExhausted = -3,
    /// Configuration validation error.
    ConfigError = -4,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&BridgeError> for CbStatus {
    fn from(e: &BridgeError) -> Self {
        match e {
            BridgeError::PoolExhausted { .. } => CbStatus::PoolExhausted,
            BridgeError::StaleToken { .. } => CbStatus::InvalidHandle,
            BridgeError::NullCallback | BridgeError::InvalidArity { .. } => {
                CbStatus::InvalidArgument
            }
        }
    }
}

impl From<&ConfigError> for CbStatus {
    fn from(_e: &ConfigError) -> Self {
        CbStatus::ConfigError
    }
}
