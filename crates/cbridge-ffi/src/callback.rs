//! C function pointers backed by C callbacks with a context pointer.
//!
//! C has no closures, so a C caller binds a `(user_data, args...)`
//! function and receives a plain `(args...)` function pointer to hand to
//! APIs that take no context argument.

use std::ffi::c_void;

use cbridge_core::{Address, Arity, BridgeError};

use crate::status::CbStatus;
use crate::trampoline::{self, Binding, CallbackToken};

/// Arity-1 C callback.
pub type CbFunc1 = unsafe extern "C" fn(user_data: *mut c_void, a: i64) -> i64;
/// Arity-2 C callback.
pub type CbFunc2 = unsafe extern "C" fn(user_data: *mut c_void, a: i64, b: i64) -> i64;
/// Arity-3 C callback (void).
pub type CbFunc3 = unsafe extern "C" fn(user_data: *mut c_void, a: i64, b: i64, c: i64);

/// Caller-owned context pointer carried into another thread's call.
struct UserData(*mut c_void);

// SAFETY: the caller who binds a callback vouches that its `user_data` may
// be used from whichever thread calls the returned pointer.
#[allow(unsafe_code)]
unsafe impl Send for UserData {}
// SAFETY: as above.
#[allow(unsafe_code)]
unsafe impl Sync for UserData {}

impl UserData {
    // Accessed through a method so closures capture the whole wrapper.
    fn get(&self) -> *mut c_void {
        self.0
    }
}

/// Write a bind result to the out-params and convert it to a status.
#[allow(unsafe_code)]
fn finish(result: Result<Binding, BridgeError>, out_ptr: *mut u64, out_token: *mut u64) -> i32 {
    match result {
        Ok(binding) => {
            // SAFETY: out_ptr was null-checked by the caller of `finish`;
            // out_token is null or writable per caller contract.
            unsafe {
                *out_ptr = binding.pointer.get();
                if !out_token.is_null() {
                    *out_token = binding.token.to_raw();
                }
            }
            CbStatus::Ok as i32
        }
        Err(e) => CbStatus::from(&e) as i32,
    }
}

/// Bind an arity-1 callback and write its `int64_t (*)(int64_t)` pointer
/// to `out_ptr` and its release token to `out_token` (which may be null).
///
/// Returns `InvalidArgument` if `f` or `out_ptr` is null and
/// `PoolExhausted` if every arity-1 trampoline is bound.
///
/// # Safety
///
/// `out_ptr` must be writable and `out_token` null or writable. `f` must
/// be safe to call with `user_data` from any thread until released.
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_addr_func1(
    f: Option<CbFunc1>,
    user_data: *mut c_void,
    out_ptr: *mut u64,
    out_token: *mut u64,
) -> i32 {
    ffi_guard!({
        if out_ptr.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        let Some(f) = f else {
            return finish(Err(BridgeError::NullCallback), out_ptr, out_token);
        };
        let data = UserData(user_data);
        // SAFETY: f and user_data are valid together per caller contract.
        let result = trampoline::bind1(move |a| unsafe { f(data.get(), a) });
        finish(result, out_ptr, out_token)
    })
}

/// Bind an arity-2 callback. See [`cb_addr_func1`].
///
/// # Safety
///
/// As for [`cb_addr_func1`].
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_addr_func2(
    f: Option<CbFunc2>,
    user_data: *mut c_void,
    out_ptr: *mut u64,
    out_token: *mut u64,
) -> i32 {
    ffi_guard!({
        if out_ptr.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        let Some(f) = f else {
            return finish(Err(BridgeError::NullCallback), out_ptr, out_token);
        };
        let data = UserData(user_data);
        // SAFETY: f and user_data are valid together per caller contract.
        let result = trampoline::bind2(move |a, b| unsafe { f(data.get(), a, b) });
        finish(result, out_ptr, out_token)
    })
}

/// Bind an arity-3 callback. The pointer written to `out_ptr` has type
/// `void (*)(int64_t, int64_t, int64_t)`. See [`cb_addr_func1`].
///
/// # Safety
///
/// As for [`cb_addr_func1`].
#[no_mangle]
#[allow(unsafe_code)]
pub unsafe extern "C" fn cb_addr_func3(
    f: Option<CbFunc3>,
    user_data: *mut c_void,
    out_ptr: *mut u64,
    out_token: *mut u64,
) -> i32 {
    ffi_guard!({
        if out_ptr.is_null() {
            return CbStatus::InvalidArgument as i32;
        }
        let Some(f) = f else {
            return finish(Err(BridgeError::NullCallback), out_ptr, out_token);
        };
        let data = UserData(user_data);
        // SAFETY: f and user_data are valid together per caller contract.
        let result = trampoline::bind3(move |a, b, c| unsafe { f(data.get(), a, b, c) });
        finish(result, out_ptr, out_token)
    })
}

/// Release the binding behind `token`. Its pointer must not be called
/// again until it is handed out by a later bind.
///
/// Returns `InvalidHandle` for unknown or already released tokens.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_func_release(token: u64) -> i32 {
    ffi_guard!({
        let Some(token) = CallbackToken::from_raw(token) else {
            return CbStatus::InvalidHandle as i32;
        };
        match trampoline::release(token) {
            Ok(()) => CbStatus::Ok as i32,
            Err(e) => CbStatus::from(&e) as i32,
        }
    })
}

/// Release whatever is bound to the arity-`arity` trampoline at `pointer`,
/// for callers that kept only the function pointer.
///
/// Returns `InvalidArgument` for an arity other than 1, 2 or 3 and
/// `InvalidHandle` if nothing is bound there.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_func_release_pointer(arity: u32, pointer: u64) -> i32 {
    ffi_guard!({
        let arity = match Arity::try_from(arity) {
            Ok(arity) => arity,
            Err(e) => return CbStatus::from(&e) as i32,
        };
        if trampoline::release_pointer(arity, Address::new(pointer)) {
            CbStatus::Ok as i32
        } else {
            CbStatus::InvalidHandle as i32
        }
    })
}

/// Number of live bindings of `arity`, or `InvalidArgument` for an arity
/// other than 1, 2 or 3.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cb_func_live(arity: u32) -> i32 {
    ffi_guard!({
        match Arity::try_from(arity) {
            Ok(arity) => trampoline::live_count(arity) as i32,
            Err(e) => CbStatus::from(&e) as i32,
        }
    })
}
