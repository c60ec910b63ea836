//! Typed scalar reads and writes.
//!
//! `read::<T>(addr)` is the embedded language's `*p`, `write::<T>(addr, v)`
//! its `*p = v`. Accesses are unaligned so that struct fields at arbitrary
//! computed offsets work.

use cbridge_core::{Address, Scalar};

/// Read a `T` at `addr`.
///
/// # Safety
///
/// `addr` must point at `size_of::<T>()` readable bytes holding a valid
/// `T`. Any bit pattern is a valid value for every [`Scalar`], so the only
/// requirement is that the memory is readable.
#[inline]
pub unsafe fn read<T: Scalar>(addr: Address) -> T {
    // SAFETY: readability of `addr..addr + size_of::<T>()` is the caller's
    // contract; read_unaligned imposes no alignment requirement.
    unsafe { addr.as_ptr::<T>().read_unaligned() }
}

/// Overwrite the `T` at `addr` with `value`.
///
/// # Safety
///
/// `addr` must point at `size_of::<T>()` writable bytes that no live Rust
/// reference aliases.
#[inline]
pub unsafe fn write<T: Scalar>(addr: Address, value: T) {
    // SAFETY: writability of the target range is the caller's contract.
    unsafe { addr.as_mut_ptr::<T>().write_unaligned(value) }
}

/// `*(int32_t *) addr`
///
/// # Safety
///
/// See [`read`].
#[inline]
pub unsafe fn read_i32(addr: Address) -> i32 {
    // SAFETY: forwarded caller contract.
    unsafe { read(addr) }
}

/// `*(int64_t *) addr`
///
/// # Safety
///
/// See [`read`].
#[inline]
pub unsafe fn read_i64(addr: Address) -> i64 {
    // SAFETY: forwarded caller contract.
    unsafe { read(addr) }
}

/// `*(double *) addr`
///
/// # Safety
///
/// See [`read`].
#[inline]
pub unsafe fn read_f64(addr: Address) -> f64 {
    // SAFETY: forwarded caller contract.
    unsafe { read(addr) }
}

/// `*(jchar *) addr`
///
/// # Safety
///
/// See [`read`].
#[inline]
pub unsafe fn read_char(addr: Address) -> u16 {
    // SAFETY: forwarded caller contract.
    unsafe { read(addr) }
}

/// `*(int32_t *) addr = value`
///
/// # Safety
///
/// See [`write`].
#[inline]
pub unsafe fn write_i32(addr: Address, value: i32) {
    // SAFETY: forwarded caller contract.
    unsafe { write(addr, value) }
}

/// `*(int64_t *) addr = value`
///
/// # Safety
///
/// See [`write`].
#[inline]
pub unsafe fn write_i64(addr: Address, value: i64) {
    // SAFETY: forwarded caller contract.
    unsafe { write(addr, value) }
}

/// `*(double *) addr = value`
///
/// # Safety
///
/// See [`write`].
#[inline]
pub unsafe fn write_f64(addr: Address, value: f64) {
    // SAFETY: forwarded caller contract.
    unsafe { write(addr, value) }
}

/// `*(jchar *) addr = value`
///
/// # Safety
///
/// See [`write`].
#[inline]
pub unsafe fn write_char(addr: Address, value: u16) {
    // SAFETY: forwarded caller contract.
    unsafe { write(addr, value) }
}
