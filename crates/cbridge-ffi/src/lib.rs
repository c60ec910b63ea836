//! C ABI for the cbridge native memory bridge.
//!
//! Exposes raw scalar and byte access through integer addresses, boxed
//! cells, host constants and callback trampolines to any language that can
//! call C. This crate is one of three that may contain `unsafe` code
//! (along with `cbridge-raw` and `cbridge-arena`).
//!
//! Functions that can fail recoverably return an `i32` [`CbStatus`]. Memory
//! access functions return the value directly: a bad address is undefined
//! behavior, not an error.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    /// Message of the last panic caught on this thread by an FFI guard.
    pub(crate) static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Store the payload of a caught panic for [`cb_last_panic_message`].
pub(crate) fn record_panic(payload: &(dyn std::any::Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    };
    log::error!("panic caught at FFI boundary: {msg}");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
}

/// Run `$body` under `catch_unwind`, returning `$default` if it panics.
macro_rules! ffi_guard_or {
    ($default:expr, $body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(payload) => {
                $crate::record_panic(&*payload);
                $default
            }
        }
    };
}

/// Run a status-returning `$body` under `catch_unwind`. A panic becomes
/// [`CbStatus::Panicked`].
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::CbStatus::Panicked as i32, $body)
    };
}

pub mod callback;
mod handle;
pub mod host;
pub mod memory;
pub mod run;
pub mod status;
pub mod trampoline;

pub use status::CbStatus;
pub use trampoline::{Binding, CallbackToken, POOL_SIZE};

/// Copy the last panic message caught on this thread into `buf`.
///
/// Writes at most `cap - 1` bytes followed by a NUL. Returns the full
/// message length in bytes (excluding the NUL), so a null `buf` or a `cap`
/// of 0 queries the length. Returns 0 if no panic has been caught.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_last_panic_message(buf: *mut c_char, cap: usize) -> i32 {
    LAST_PANIC.with(|cell| {
        let msg = cell.borrow();
        let bytes = msg.as_bytes();
        if !buf.is_null() && cap > 0 {
            let n = bytes.len().min(cap - 1);
            // SAFETY: buf is valid for cap bytes per caller contract, and n < cap.
            unsafe {
                std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
                *buf.add(n) = 0;
            }
        }
        i32::try_from(bytes.len()).unwrap_or(i32::MAX)
    })
}

/// Serializes tests that touch the process-wide registry or run arena.
#[cfg(test)]
pub(crate) fn serial_guard() -> std::sync::MutexGuard<'static, ()> {
    static SERIAL: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SERIAL
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_passes_through_value() {
        let status = ffi_guard!({ CbStatus::Ok as i32 });
        assert_eq!(status, 0);
        let v: u64 = ffi_guard_or!(0, { 7 });
        assert_eq!(v, 7);
    }

    #[test]
    fn guard_catches_panic_and_stores_message() {
        LAST_PANIC.with(|cell| cell.borrow_mut().clear());
        assert_eq!(cb_last_panic_message(std::ptr::null_mut(), 0), 0);

        let status = ffi_guard!({
            panic!("deliberate bridge panic");
        });
        assert_eq!(status, CbStatus::Panicked as i32);

        let len = cb_last_panic_message(std::ptr::null_mut(), 0);
        assert_eq!(len as usize, "deliberate bridge panic".len());
        let mut buf = vec![0u8; len as usize + 1];
        let len2 = cb_last_panic_message(buf.as_mut_ptr() as *mut c_char, buf.len());
        assert_eq!(len, len2);
        assert_eq!(&buf[..len as usize], b"deliberate bridge panic");
        assert_eq!(buf[len as usize], 0);
    }

    #[test]
    fn panic_message_is_truncated_to_buffer() {
        let _: i32 = ffi_guard!({
            panic!("{}", "x".repeat(40));
        });
        let mut buf = [0xAAu8; 8];
        let len = cb_last_panic_message(buf.as_mut_ptr() as *mut c_char, buf.len());
        assert_eq!(len, 40);
        assert_eq!(&buf[..7], b"xxxxxxx");
        assert_eq!(buf[7], 0);
    }

    #[test]
    fn guard_or_returns_default_on_panic() {
        let v: u64 = ffi_guard_or!(0, {
            panic!("no value");
        });
        assert_eq!(v, 0);
    }
}
