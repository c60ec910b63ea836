//! Host constants and `timeval` arithmetic.

use cbridge_core::{eof_sentinel, sizeof_scalar, Address, CType};

/// `sizeof(int)` on this host.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_sizeof_int() -> i32 {
    sizeof_scalar(CType::Int)
}

/// `sizeof(long)` on this host.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_sizeof_long() -> i32 {
    sizeof_scalar(CType::Long)
}

/// `sizeof(double)` on this host.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_sizeof_double() -> i32 {
    sizeof_scalar(CType::Double)
}

/// `sizeof(char)` on this host.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_sizeof_char() -> i32 {
    sizeof_scalar(CType::Char)
}

/// The C library's `EOF`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_eof() -> i32 {
    eof_sentinel()
}

/// Store `*t2 - *t1` in `*result` and return it in milliseconds.
///
/// `result` may alias `t2` or `t1`.
///
/// # Safety
///
/// All three pointers must be valid `struct timeval`s; `result` must be
/// writable.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_timeval_subtract(
    result: *mut libc::timeval,
    t2: *const libc::timeval,
    t1: *const libc::timeval,
) -> i64 {
    // SAFETY: forwarded caller contract.
    unsafe {
        cbridge_raw::timestamp_diff_ms(
            Address::from_mut_ptr(result),
            Address::from_ptr(t2),
            Address::from_ptr(t1),
        )
    }
}
