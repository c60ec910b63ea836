//! Per-run native state: boxed cells, pinned byte copies, callbacks.
//!
//! One embedded-program run allocates freely through `cb_addr_*` and
//! tears everything down at once with [`cb_run_reset`]. Every address and
//! function pointer handed out during the run dangles afterwards.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cbridge_arena::CellArena;
use cbridge_core::{Address, ArenaConfig, Arity, ConfigError, Scalar};
use cbridge_raw::Pinned;

use crate::status::CbStatus;
use crate::trampoline;

#[derive(Default)]
struct Run {
    cells: CellArena,
    pinned: Vec<Pinned>,
}

static RUN: Mutex<Option<Run>> = Mutex::new(None);

/// The run state, created with the default arena on first use.
///
/// Arena and pin-list updates are single pushes, so a poisoned lock still
/// guards consistent state and is recovered.
fn run() -> MutexGuard<'static, Option<Run>> {
    RUN.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Box `value` into the run arena and return the cell's address.
pub fn boxed_address<T: Scalar>(value: T) -> Address {
    run()
        .get_or_insert_with(Run::default)
        .cells
        .boxed_address(value)
}

/// Copy `bytes` into a pinned buffer that lives until the next reset.
pub fn pin_copy(bytes: &[u8]) -> Address {
    let pinned = Pinned::new(bytes.to_vec());
    let addr = pinned.address();
    run().get_or_insert_with(Run::default).pinned.push(pinned);
    addr
}

/// Free every boxed cell and pinned copy, and release every callback.
pub fn reset() {
    if let Some(state) = run().as_mut() {
        state.cells.reset();
        state.pinned.clear();
    }
    trampoline::clear();
}

/// Replace the run arena with one built from `config`.
///
/// Implies [`reset`]: the old arena and its cells are dropped.
pub fn configure(config: ArenaConfig) -> Result<(), ConfigError> {
    let cells = CellArena::new(config)?;
    log::debug!("run arena reconfigured: {:?}", cells.config());
    *run() = Some(Run {
        cells,
        pinned: Vec::new(),
    });
    trampoline::clear();
    Ok(())
}

/// Snapshot of run-wide resource usage.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CbRunStats {
    /// Boxed cells allocated since the last reset.
    pub cells: u64,
    /// Arena chunks held.
    pub chunks: u64,
    /// Arena bytes handed out, including padding.
    pub used_bytes: u64,
    /// Arena bytes held from the system.
    pub capacity_bytes: u64,
    /// Pinned byte copies alive.
    pub pinned_buffers: u64,
    /// Live arity-1 callbacks.
    pub live_func1: u32,
    /// Live arity-2 callbacks.
    pub live_func2: u32,
    /// Live arity-3 callbacks.
    pub live_func3: u32,
}

/// Current run-wide resource usage.
pub fn stats() -> CbRunStats {
    let mut stats = CbRunStats::default();
    if let Some(state) = run().as_ref() {
        stats.cells = state.cells.cell_count() as u64;
        stats.chunks = state.cells.chunk_count() as u64;
        stats.used_bytes = state.cells.used_bytes() as u64;
        stats.capacity_bytes = state.cells.capacity_bytes() as u64;
        stats.pinned_buffers = state.pinned.len() as u64;
    }
    stats.live_func1 = trampoline::live_count(Arity::One) as u32;
    stats.live_func2 = trampoline::live_count(Arity::Two) as u32;
    stats.live_func3 = trampoline::live_count(Arity::Three) as u32;
    stats
}

/// Box a 32-bit integer. Returns 0 if boxing panicked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_addr_int(value: i32) -> u64 {
    ffi_guard_or!(0, { boxed_address(value).get() })
}

/// Box a 64-bit integer. Returns 0 if boxing panicked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_addr_long(value: i64) -> u64 {
    ffi_guard_or!(0, { boxed_address(value).get() })
}

/// Box a double. Returns 0 if boxing panicked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_addr_double(value: f64) -> u64 {
    ffi_guard_or!(0, { boxed_address(value).get() })
}

/// Box a UTF-16 code unit. Returns 0 if boxing panicked.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_addr_char(value: u16) -> u64 {
    ffi_guard_or!(0, { boxed_address(value).get() })
}

/// Copy `n` bytes of `buf` into a pinned buffer and return its address.
///
/// The copy lives until [`cb_run_reset`]. Returns 0 if `buf` is null and
/// `n > 0`.
///
/// # Safety
///
/// `buf` must be readable for `n` bytes.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_addr_bytes(buf: *const u8, n: usize) -> u64 {
    ffi_guard_or!(0, {
        let bytes: &[u8] = if n == 0 {
            &[]
        } else if buf.is_null() {
            return 0;
        } else {
            // SAFETY: buf is non-null and readable for n bytes per caller contract.
            unsafe { std::slice::from_raw_parts(buf, n) }
        };
        pin_copy(bytes).get()
    })
}

/// Free every boxed cell and pinned copy and release every callback.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_run_reset() -> i32 {
    ffi_guard!({
        reset();
        CbStatus::Ok as i32
    })
}

/// Rebuild the run arena with `chunk_bytes`-sized chunks. Implies a reset.
///
/// Returns `ConfigError` if `chunk_bytes` is not a power of two between
/// 64 bytes and 1 GiB; the current arena is kept in that case.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_run_configure(chunk_bytes: usize) -> i32 {
    ffi_guard!({
        match configure(ArenaConfig::with_chunk_bytes(chunk_bytes)) {
            Ok(()) => CbStatus::Ok as i32,
            Err(e) => CbStatus::from(&e) as i32,
        }
    })
}

/// Write a [`CbRunStats`] snapshot to `out`.
///
/// # Safety
///
/// `out` must be null or writable.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_run_stats(out: *mut CbRunStats) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        let snapshot = stats();
        // SAFETY: out is non-null and writable per caller contract.
        unsafe { *out = snapshot };
        CbStatus::Ok as i32
    })
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::memory::{cb_assign_long, cb_deref_bytes, cb_deref_double, cb_deref_int};

    #[test]
    fn boxed_cells_read_back() {
        let _serial = crate::serial_guard();
        let i = cb_addr_int(41);
        let d = cb_addr_double(-2.5);
        let l = cb_addr_long(0);
        unsafe {
            assert_eq!(cb_deref_int(i), 41);
            assert_eq!(cb_deref_double(d), -2.5);
            cb_assign_long(l, 1 << 50);
            assert_eq!(crate::memory::cb_deref_long(l), 1 << 50);
        }
        assert_ne!(cb_addr_char(b'q'.into()), 0);
    }

    #[test]
    fn reset_clears_cells_and_callbacks() {
        let _serial = crate::serial_guard();
        cb_addr_int(1);
        cb_addr_long(2);
        unsafe { cb_addr_bytes(b"abc".as_ptr(), 3) };
        let binding = trampoline::bind2(|a, b| a - b).unwrap();

        let before = stats();
        assert!(before.cells >= 2);
        assert!(before.pinned_buffers >= 1);
        assert!(before.live_func2 >= 1);

        assert_eq!(cb_run_reset(), CbStatus::Ok as i32);
        let after = stats();
        assert_eq!(after.cells, 0);
        assert_eq!(after.used_bytes, 0);
        assert_eq!(after.pinned_buffers, 0);
        assert_eq!(
            (after.live_func1, after.live_func2, after.live_func3),
            (0, 0, 0)
        );
        assert!(trampoline::release(binding.token).is_err());
    }

    #[test]
    fn pinned_copy_is_independent_of_source() {
        let _serial = crate::serial_guard();
        let mut src = *b"pin me";
        let addr = unsafe { cb_addr_bytes(src.as_ptr(), src.len()) };
        src[0] = b'X';
        let mut out = [0u8; 6];
        unsafe { cb_deref_bytes(addr, out.as_mut_ptr(), 6) };
        assert_eq!(&out, b"pin me");
        assert_eq!(unsafe { cb_addr_bytes(std::ptr::null(), 4) }, 0);
    }

    #[test]
    fn configure_validates_and_replaces_arena() {
        let _serial = crate::serial_guard();
        assert_eq!(cb_run_configure(100), CbStatus::ConfigError as i32);
        assert_eq!(cb_run_configure(16), CbStatus::ConfigError as i32);
        assert_eq!(cb_run_configure(1 << 62), CbStatus::ConfigError as i32);
        assert_eq!(cb_run_configure(1 << 63), CbStatus::ConfigError as i32);

        assert_eq!(cb_run_configure(64), CbStatus::Ok as i32);
        for v in 0..20 {
            cb_addr_long(v);
        }
        assert!(stats().chunks > 1);

        assert_eq!(
            cb_run_configure(ArenaConfig::DEFAULT_CHUNK_BYTES),
            CbStatus::Ok as i32
        );
        let s = stats();
        assert_eq!((s.cells, s.chunks), (0, 1));
    }

    #[test]
    fn stats_rejects_null() {
        assert_eq!(
            unsafe { cb_run_stats(std::ptr::null_mut()) },
            CbStatus::InvalidArgument as i32
        );
        let mut out = CbRunStats::default();
        assert_eq!(unsafe { cb_run_stats(&mut out) }, CbStatus::Ok as i32);
    }
}
