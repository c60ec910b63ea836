//! JVM bindings for the cbridge native memory bridge.
//!
//! Implements the native methods of the `ch.epfl.data.cscala.CLangNative`
//! Scala object. Addresses travel through the JVM as `long`s. Memory
//! accesses are unchecked: a bad address crashes the JVM exactly as it
//! would in C.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(non_snake_case)]

mod callback;
mod error;

use cbridge_core::{eof_sentinel, sizeof_scalar, Address, Arity, CType};
use cbridge_ffi::run;
use cbridge_raw::{buffer, scalar};
use jni::objects::{JByteArray, JObject, ReleaseMode};
use jni::sys::{jboolean, jbyteArray, jchar, jdouble, jint, jlong, JNI_FALSE, JNI_TRUE};
use jni::JNIEnv;

use crate::error::{or_throw, HostError};

// Scalar reads.

/// `deref_long(ptr: Long): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_deref_1long<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
) -> jlong {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::read_i64(Address::from_jlong(ptr)) }
}

/// `deref_double(ptr: Long): Double`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_deref_1double<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
) -> jdouble {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::read_f64(Address::from_jlong(ptr)) }
}

/// `deref_int(ptr: Long): Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_deref_1int<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
) -> jint {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::read_i32(Address::from_jlong(ptr)) }
}

/// `deref_char(ptr: Long): Char`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_deref_1char<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
) -> jchar {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::read_char(Address::from_jlong(ptr)) }
}

/// `deref_bytes(ptr: Long, n: Int): Array[Byte]`
///
/// A negative `n` raises `NegativeArraySizeException` from the JVM.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_deref_1bytes<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    n: jint,
) -> jbyteArray {
    let result = (|| -> Result<JByteArray<'local>, HostError> {
        let array = env.new_byte_array(n)?;
        // SAFETY: the caller vouches that ptr is readable for n bytes; n is
        // non-negative since the array was created.
        let bytes = unsafe { buffer::read_bytes(Address::from_jlong(ptr), n as usize) };
        let signed: Vec<i8> = bytes.into_iter().map(|b| b as i8).collect();
        env.set_byte_array_region(&array, 0, &signed)?;
        Ok(array)
    })();
    match result {
        Ok(array) => array.into_raw(),
        Err(err) => {
            error::throw(&mut env, err);
            std::ptr::null_mut()
        }
    }
}

// Host sizes.

/// `sizeof_int: Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_sizeof_1int<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jint {
    sizeof_scalar(CType::Int)
}

/// `sizeof_long: Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_sizeof_1long<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jint {
    sizeof_scalar(CType::Long)
}

/// `sizeof_double: Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_sizeof_1double<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jint {
    sizeof_scalar(CType::Double)
}

/// `sizeof_char: Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_sizeof_1char<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jint {
    sizeof_scalar(CType::Char)
}

// Boxing. Cells live until `reset_cells`.

/// `addr_long(v: Long): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1long<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    val: jlong,
) -> jlong {
    run::boxed_address(val).to_jlong()
}

/// `addr_double(v: Double): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1double<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    val: jdouble,
) -> jlong {
    run::boxed_address(val).to_jlong()
}

/// `addr_int(v: Int): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1int<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    val: jint,
) -> jlong {
    run::boxed_address(val).to_jlong()
}

/// `addr_char(v: Char): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1char<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    val: jchar,
) -> jlong {
    run::boxed_address(val).to_jlong()
}

/// `addr_bytes(bytes: Array[Byte], n: Int): Long`
///
/// Returns the address of the array's elements as handed out by the JVM
/// and never releases them, so the address stays valid for the life of
/// the array. If the JVM chose to copy, native writes are not seen by the
/// array.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1bytes<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    bytes: JByteArray<'local>,
    _n: jint,
) -> jlong {
    // SAFETY: no other live view of `bytes` exists on this thread.
    let result = unsafe { env.get_array_elements(&bytes, ReleaseMode::NoCopyBack) }
        .map(|elements| {
            let addr = Address::from_mut_ptr(elements.as_ptr());
            std::mem::forget(elements);
            addr.to_jlong()
        })
        .map_err(HostError::from);
    or_throw(&mut env, result, 0)
}

// Scalar writes.

/// `assign_long(ptr: Long, v: Long): Unit`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_assign_1long<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    val: jlong,
) {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::write_i64(Address::from_jlong(ptr), val) }
}

/// `assign_double(ptr: Long, v: Double): Unit`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_assign_1double<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    val: jdouble,
) {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::write_f64(Address::from_jlong(ptr), val) }
}

/// `assign_int(ptr: Long, v: Int): Unit`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_assign_1int<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    val: jint,
) {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::write_i32(Address::from_jlong(ptr), val) }
}

/// `assign_char(ptr: Long, v: Char): Unit`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_assign_1char<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    val: jchar,
) {
    // SAFETY: the caller vouches for ptr.
    unsafe { scalar::write_char(Address::from_jlong(ptr), val) }
}

/// `assign_bytes(ptr: Long, bytes: Array[Byte], n: Int): Unit`
///
/// Copies the first `n` elements. `n` beyond the array raises
/// `ArrayIndexOutOfBoundsException` and writes nothing.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_assign_1bytes<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    ptr: jlong,
    bytes: JByteArray<'local>,
    n: jint,
) {
    let result = (|| -> Result<(), HostError> {
        let len = usize::try_from(n).map_err(|_| HostError::NegativeLength(n))?;
        let mut signed = vec![0i8; len];
        env.get_byte_array_region(&bytes, 0, &mut signed)?;
        let unsigned: Vec<u8> = signed.into_iter().map(|b| b as u8).collect();
        // SAFETY: the caller vouches that ptr is writable for n bytes.
        unsafe { buffer::write_bytes(Address::from_jlong(ptr), &unsigned, len) };
        Ok(())
    })();
    or_throw(&mut env, result, ());
}

// Callbacks.

/// `addr_func1(f: Long => Long): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1func1<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    func: JObject<'local>,
) -> jlong {
    let result = callback::bind_callable(&mut env, Arity::One, &func);
    or_throw(&mut env, result.map(Address::to_jlong), 0)
}

/// `addr_func2(f: (Long, Long) => Long): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1func2<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    func: JObject<'local>,
) -> jlong {
    let result = callback::bind_callable(&mut env, Arity::Two, &func);
    or_throw(&mut env, result.map(Address::to_jlong), 0)
}

/// `addr_func3(f: (Long, Long, Long) => Long): Long`
///
/// The native pointer is `void (*)(int64_t, int64_t, int64_t)`: the
/// result of `apply` is discarded.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_addr_1func3<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
    func: JObject<'local>,
) -> jlong {
    let result = callback::bind_callable(&mut env, Arity::Three, &func);
    or_throw(&mut env, result.map(Address::to_jlong), 0)
}

/// `free_func(fp: Long): Boolean`
///
/// Drops the callable behind a pointer from `addr_funcN`. Returns `false`
/// if nothing is bound there.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_free_1func<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    fp: jlong,
) -> jboolean {
    if callback::release_pointer(Address::from_jlong(fp)) {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

// Host utilities.

/// `eof: Int`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_eof<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jint {
    eof_sentinel()
}

/// `timeval_subtract(result: Long, t2: Long, t1: Long): Long`
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_timeval_1subtract<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
    result: jlong,
    t2: jlong,
    t1: jlong,
) -> jlong {
    // SAFETY: the caller vouches for all three timeval addresses.
    unsafe {
        cbridge_raw::timestamp_diff_ms(
            Address::from_jlong(result),
            Address::from_jlong(t2),
            Address::from_jlong(t1),
        )
    }
}

/// `reset_cells: Unit`
///
/// Frees every boxed cell and drops every bound callable. Addresses and
/// function pointers obtained earlier must not be used afterwards.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "system" fn Java_ch_epfl_data_cscala_CLangNative_00024_reset_1cells<'local>(
    _env: JNIEnv<'local>,
    _this: JObject<'local>,
) {
    run::reset();
}
