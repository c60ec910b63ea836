//! Scalar and byte access through raw addresses.
//!
//! These functions perform no validation of `addr`: it is an integer the
//! caller computed, and a bad one is undefined behavior. Only pointers to
//! caller-owned buffers are null-checked.

use cbridge_core::Address;
use cbridge_raw::{buffer, scalar};

use crate::status::CbStatus;

/// Read the 32-bit integer at `addr`.
///
/// # Safety
///
/// `addr` must be readable for 4 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_deref_int(addr: u64) -> i32 {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::read_i32(Address::new(addr)) }
}

/// Read the 64-bit integer at `addr`.
///
/// # Safety
///
/// `addr` must be readable for 8 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_deref_long(addr: u64) -> i64 {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::read_i64(Address::new(addr)) }
}

/// Read the double at `addr`.
///
/// # Safety
///
/// `addr` must be readable for 8 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_deref_double(addr: u64) -> f64 {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::read_f64(Address::new(addr)) }
}

/// Read the UTF-16 code unit at `addr`.
///
/// # Safety
///
/// `addr` must be readable for 2 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_deref_char(addr: u64) -> u16 {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::read_char(Address::new(addr)) }
}

/// Store a 32-bit integer at `addr`.
///
/// # Safety
///
/// `addr` must be writable for 4 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_assign_int(addr: u64, value: i32) {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::write_i32(Address::new(addr), value) }
}

/// Store a 64-bit integer at `addr`.
///
/// # Safety
///
/// `addr` must be writable for 8 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_assign_long(addr: u64, value: i64) {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::write_i64(Address::new(addr), value) }
}

/// Store a double at `addr`.
///
/// # Safety
///
/// `addr` must be writable for 8 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_assign_double(addr: u64, value: f64) {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::write_f64(Address::new(addr), value) }
}

/// Store a UTF-16 code unit at `addr`.
///
/// # Safety
///
/// `addr` must be writable for 2 bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_assign_char(addr: u64, value: u16) {
    // SAFETY: forwarded caller contract.
    unsafe { scalar::write_char(Address::new(addr), value) }
}

/// Copy `n` bytes starting at `addr` into `out`.
///
/// Returns `InvalidArgument` if `out` is null and `n > 0`.
///
/// # Safety
///
/// `addr` must be readable and `out` writable for `n` bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_deref_bytes(addr: u64, out: *mut u8, n: usize) -> i32 {
    ffi_guard!({
        if n == 0 {
            return CbStatus::Ok as i32;
        }
        if out.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        // SAFETY: forwarded caller contract; out is non-null and valid for n bytes.
        unsafe {
            let bytes = buffer::read_bytes(Address::new(addr), n);
            std::slice::from_raw_parts_mut(out, n).copy_from_slice(&bytes);
        }
        CbStatus::Ok as i32
    })
}

/// Copy `n` bytes from `buf` to `addr`.
///
/// Returns `InvalidArgument` if `buf` is null and `n > 0`.
///
/// # Safety
///
/// `buf` must be readable and `addr` writable for `n` bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_assign_bytes(addr: u64, buf: *const u8, n: usize) -> i32 {
    ffi_guard!({
        if n == 0 {
            return CbStatus::Ok as i32;
        }
        if buf.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        // SAFETY: forwarded caller contract; buf is non-null and valid for n bytes.
        unsafe {
            let src = std::slice::from_raw_parts(buf, n);
            buffer::write_bytes(Address::new(addr), src, n);
        }
        CbStatus::Ok as i32
    })
}
